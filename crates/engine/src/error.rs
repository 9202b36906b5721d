// ============================
// crates/engine/src/error.rs
// ============================
//! Central error types for the store layer and the authentication protocol.
use thiserror::Error;

/// Failures surfaced by a [`crate::storage::CredentialStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing store could not be reached or refused the operation.
    #[error("backing store unavailable: {0}")]
    Unavailable(String),

    /// No record exists for the requested identifier.
    #[error("record not found")]
    NotFound,

    /// A persisted record could not be decoded.
    #[error("malformed record: {0}")]
    Corrupt(String),
}

impl From<sled::Error> for StoreError {
    fn from(e: sled::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

/// Failures surfaced by the authentication engine.
///
/// `InvalidCredentials` is deliberately the single outcome for every login
/// failure branch: unknown name, duplicate name, lookup error, hash-fetch
/// error, malformed hash, and wrong password all read the same to the
/// caller, so the error surface cannot be used to enumerate users.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The store session or its backing structures could not be established.
    #[error("authentication failed, could not initialize authenticator: {0}")]
    Init(#[source] StoreError),

    /// Undifferentiated login rejection. The message never varies by branch.
    #[error("authentication failed, username-password combination does not exist")]
    InvalidCredentials,
}

impl AuthError {
    /// True when a retry of `initialize` might help (operational failure
    /// rather than a credential rejection).
    pub fn is_init_failure(&self) -> bool {
        matches!(self, AuthError::Init(_))
    }
}
