mod password;
pub use password::{hash_password, verify_password};
mod jwt;
pub use jwt::{UserClaims, generate_token, process_token};
mod code;
pub use code::{generate_state, generate_verification_code, mask_email};
mod error;
pub use error::{CryptError, CryptResult};
