pub mod cpf;
pub mod signal;
