// ============================
// crates/engine/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod engine;
pub mod password;
pub mod token;

pub use engine::{AuthEngine, Authenticator, SessionState};
pub use password::{
    hash_password, hash_password_secure, validate_password_strength, verify_password,
    Argon2Settings, PasswordRequirements, MIN_PASSWORD_LENGTH,
};
pub use token::{RandomTokenIssuer, TokenIssuer};
