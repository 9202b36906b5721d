// ============================
// crates/engine/src/lib.rs
// ============================
//! Core credential-verification engine.
//!
//! Authenticates a named agent against a persisted Argon2 password hash and
//! issues an opaque session token on success. The caller-facing surface is
//! [`Authenticator`] (`initialize` / `login` / `disconnect`), implemented by
//! [`AuthEngine`] over a [`storage::CredentialStore`] and a
//! [`auth::TokenIssuer`].

pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;

pub use auth::{AuthEngine, Authenticator, RandomTokenIssuer, SessionState, TokenIssuer};
pub use config::Settings;
pub use error::{AuthError, StoreError};
pub use storage::{CredentialStore, SledCredentialStore};
