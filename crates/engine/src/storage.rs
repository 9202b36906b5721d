// ============================
// crates/engine/src/storage.rs
// ============================
//! Credential store abstraction with a sled-backed implementation.
//!
//! The [`CredentialStore`] trait is the contract the authentication engine
//! depends on; it deliberately exposes lookup and hash retrieval only.
//! Provisioning helpers live on the concrete store, outside the contract,
//! so login paths stay read-only.
use std::collections::BTreeMap;

use credgate_common::Principal;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;

/// Tree holding principal property maps, keyed by uuid bytes.
const PRINCIPALS_TREE: &str = "principals";

/// Tree holding PHC password-hash strings, keyed by uuid bytes.
const CREDENTIALS_TREE: &str = "credentials";

/// Contract between the authentication engine and a backing store.
pub trait CredentialStore {
    /// Live connection/context to the backing store.
    type Session;

    /// Establish a store session. `resource` is a store-specific hint
    /// (a directory path for the sled implementation).
    fn connect(&self, resource: &str) -> Result<Self::Session, StoreError>;

    /// Create the backing structures if absent. Idempotent.
    fn ensure_schema(&self, session: &Self::Session) -> Result<(), StoreError>;

    /// Identifiers of principals matching `{Name = name, Type = principal_type}`.
    ///
    /// Returns zero, one, or many matches; multiplicity is the caller's
    /// concern, not this layer's.
    fn find_principals(
        &self,
        session: &Self::Session,
        name: &str,
        principal_type: &str,
    ) -> Result<Vec<Uuid>, StoreError>;

    /// Stored password hash for a principal identifier.
    fn fetch_password_hash(&self, session: &Self::Session, id: Uuid) -> Result<String, StoreError>;

    /// Release the store session.
    fn close(&self, session: Self::Session) -> Result<(), StoreError>;
}

/// Sled-backed implementation of the [`CredentialStore`] trait.
///
/// Principals live in one tree (uuid bytes → JSON property map), password
/// hashes in another (uuid bytes → PHC string). A session is a live
/// `sled::Db` handle; sled holds a per-directory lock, so one engine owns
/// one session at a time.
#[derive(Debug, Clone, Default)]
pub struct SledCredentialStore;

impl SledCredentialStore {
    pub fn new() -> Self {
        Self
    }

    fn principals(db: &sled::Db) -> Result<sled::Tree, StoreError> {
        Ok(db.open_tree(PRINCIPALS_TREE)?)
    }

    fn credentials(db: &sled::Db) -> Result<sled::Tree, StoreError> {
        Ok(db.open_tree(CREDENTIALS_TREE)?)
    }

    /// Provision an Agent-typed principal with a pre-hashed password.
    ///
    /// Name uniqueness is not enforced here; the login protocol treats a
    /// duplicate name as a failed lookup.
    pub fn create_agent(
        &self,
        session: &sled::Db,
        name: &str,
        password_hash: &str,
    ) -> Result<Uuid, StoreError> {
        let principal = Principal::agent(name);
        let value = serde_json::to_vec(&principal.properties)?;

        Self::principals(session)?.insert(principal.id.as_bytes(), value)?;
        Self::credentials(session)?.insert(principal.id.as_bytes(), password_hash.as_bytes())?;
        session.flush()?;

        debug!(id = %principal.id, "provisioned agent principal");
        Ok(principal.id)
    }

    /// All stored principals, in key order.
    pub fn list_principals(&self, session: &sled::Db) -> Result<Vec<Principal>, StoreError> {
        let mut out = Vec::new();
        for entry in Self::principals(session)?.iter() {
            let (key, value) = entry?;
            out.push(decode_principal(&key, &value)?);
        }
        Ok(out)
    }
}

fn decode_principal(key: &[u8], value: &[u8]) -> Result<Principal, StoreError> {
    let id = Uuid::from_slice(key).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    let properties: BTreeMap<String, String> = serde_json::from_slice(value)?;
    Ok(Principal::new(id, properties))
}

impl CredentialStore for SledCredentialStore {
    type Session = sled::Db;

    fn connect(&self, resource: &str) -> Result<sled::Db, StoreError> {
        let db = sled::open(resource)?;
        debug!(resource, "credential store session established");
        Ok(db)
    }

    /// Opening a tree creates it if absent, so this is naturally idempotent.
    fn ensure_schema(&self, session: &sled::Db) -> Result<(), StoreError> {
        Self::principals(session)?;
        Self::credentials(session)?;
        Ok(())
    }

    fn find_principals(
        &self,
        session: &sled::Db,
        name: &str,
        principal_type: &str,
    ) -> Result<Vec<Uuid>, StoreError> {
        let mut matches = Vec::new();
        for entry in Self::principals(session)?.iter() {
            let (key, value) = entry?;
            let principal = decode_principal(&key, &value)?;
            if principal.matches(name, principal_type) {
                matches.push(principal.id);
            }
        }
        Ok(matches)
    }

    fn fetch_password_hash(&self, session: &sled::Db, id: Uuid) -> Result<String, StoreError> {
        let raw = Self::credentials(session)?
            .get(id.as_bytes())?
            .ok_or(StoreError::NotFound)?;
        String::from_utf8(raw.to_vec()).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn close(&self, session: sled::Db) -> Result<(), StoreError> {
        session.flush()?;
        Ok(())
    }
}
