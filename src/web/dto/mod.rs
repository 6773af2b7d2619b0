pub mod account;
pub mod auth;
pub mod courses;
pub mod payment;
pub mod progress;
pub mod quiz;
