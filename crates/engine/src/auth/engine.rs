// ============================
// crates/engine/src/auth/engine.rs
// ============================
//! The authentication engine: connect → lookup → verify → issue-token,
//! with explicit store-session lifecycle.
//!
//! Every login failure branch collapses into [`AuthError::InvalidCredentials`]
//! before leaving this module; only initialize-phase failures surface their
//! underlying cause, because those are operational rather than security
//! conditions.
use credgate_common::{AgentIdentity, Token, AGENT_TYPE};
use metrics::counter;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::password::{self, Argon2Settings};
use crate::auth::token::TokenIssuer;
use crate::error::{AuthError, StoreError};
use crate::metrics::{LOGIN_REJECTED, LOGIN_SUCCESS};
use crate::storage::CredentialStore;

/// Parseable Argon2id hash of no known password. Used only if decoy
/// generation fails at initialize time; verifying against it still costs a
/// full Argon2 pass.
const DECOY_FALLBACK: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY";

/// Host-framework authenticator role: any store/verifier pair implementing
/// this can be substituted.
pub trait Authenticator {
    /// Establish the store session and supporting structures. Idempotent in
    /// effect: calling it again succeeds and does not duplicate structures.
    fn initialize(&mut self, resource: &str) -> Result<(), AuthError>;

    /// Authenticate `agent_name` with `plain_password`, issuing a session
    /// token on success. Initializes the engine first if needed.
    fn login(
        &mut self,
        agent_name: &str,
        plain_password: &str,
        resource: &str,
    ) -> Result<Token, AuthError>;

    /// Release the store session. No-op when no session was established.
    fn disconnect(&mut self);
}

/// Lifecycle of the engine-owned store session.
#[derive(Debug)]
pub enum SessionState<S> {
    /// No store session held.
    Uninitialized,
    /// Store session established; lookups and verification can proceed.
    Ready(S),
    /// Session released. `login`/`initialize` establish a fresh one.
    Disconnected,
}

/// Orchestrates the login protocol over a [`CredentialStore`] and a
/// [`TokenIssuer`].
///
/// One engine instance owns one store session and serves one logical caller
/// context at a time; callers sharing an engine must add their own mutual
/// exclusion around `login`/`disconnect`.
pub struct AuthEngine<C: CredentialStore, T: TokenIssuer> {
    store: C,
    issuer: T,
    argon2: Argon2Settings,
    state: SessionState<C::Session>,
    decoy_hash: Option<String>,
}

impl<C: CredentialStore, T: TokenIssuer> AuthEngine<C, T> {
    /// Engine with default Argon2 cost settings for the decoy hash.
    pub fn new(store: C, issuer: T) -> Self {
        Self::with_settings(store, issuer, Argon2Settings::default())
    }

    /// Engine whose decoy hash matches the cost the deployment provisions
    /// credentials with, keeping failure branches time-equivalent.
    pub fn with_settings(store: C, issuer: T, argon2: Argon2Settings) -> Self {
        Self {
            store,
            issuer,
            argon2,
            state: SessionState::Uninitialized,
            decoy_hash: None,
        }
    }

    /// Whether a store session is currently established.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, SessionState::Ready(_))
    }

    /// The live store session, initializing first if absent. Pass-through
    /// for callers needing raw store access; not part of the login protocol.
    pub fn session(&mut self, resource: &str) -> Result<&C::Session, AuthError> {
        if !self.is_ready() {
            self.initialize(resource)?;
        }
        match &self.state {
            SessionState::Ready(session) => Ok(session),
            _ => Err(AuthError::Init(StoreError::Unavailable(
                "session not established".into(),
            ))),
        }
    }

    /// Spend one password verification on a decoy hash so rejection paths
    /// that never reach a real hash cost the same as a wrong password.
    fn burn_verification(&self, plain: &str) {
        if let Some(hash) = &self.decoy_hash {
            let _ = password::verify_password(hash, plain);
        }
    }

    fn rejected(&self, plain: &str, burn: bool) -> AuthError {
        if burn {
            self.burn_verification(plain);
        }
        counter!(LOGIN_REJECTED).increment(1);
        AuthError::InvalidCredentials
    }
}

impl<C: CredentialStore, T: TokenIssuer> Authenticator for AuthEngine<C, T> {
    fn initialize(&mut self, resource: &str) -> Result<(), AuthError> {
        // Tear down any live session first; the backing store may hold a
        // per-resource lock that a second connect would contend on.
        if let SessionState::Ready(old) =
            std::mem::replace(&mut self.state, SessionState::Uninitialized)
        {
            if let Err(e) = self.store.close(old) {
                warn!(error = %e, "error closing previous store session");
            }
        }

        let session = self.store.connect(resource).map_err(AuthError::Init)?;
        self.store.ensure_schema(&session).map_err(AuthError::Init)?;

        // Prepare the verifier: a decoy hash at the configured cost, burned
        // on rejection paths that never reach a stored hash.
        if self.decoy_hash.is_none() {
            let filler = Uuid::new_v4().to_string();
            let decoy = password::hash_password_with(&self.argon2, &filler).unwrap_or_else(|e| {
                warn!(error = %e, "decoy generation failed, using built-in fallback");
                DECOY_FALLBACK.to_string()
            });
            self.decoy_hash = Some(decoy);
        }

        self.state = SessionState::Ready(session);
        debug!("authenticator initialized");
        Ok(())
    }

    fn login(
        &mut self,
        agent_name: &str,
        plain_password: &str,
        resource: &str,
    ) -> Result<Token, AuthError> {
        // An empty name or password is rejected outright, before any store
        // traffic.
        if agent_name.is_empty() || plain_password.is_empty() {
            counter!(LOGIN_REJECTED).increment(1);
            return Err(AuthError::InvalidCredentials);
        }

        if !self.is_ready() {
            self.initialize(resource)?;
        }
        let SessionState::Ready(session) = &self.state else {
            return Err(AuthError::Init(StoreError::Unavailable(
                "session not established".into(),
            )));
        };

        let ids = match self.store.find_principals(session, agent_name, AGENT_TYPE) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "principal lookup failed");
                return Err(self.rejected(plain_password, true));
            }
        };

        // Exactly one Agent-typed principal per name is the contract; zero
        // and many both fail, and the caller cannot tell which it was.
        if ids.len() != 1 {
            debug!(matches = ids.len(), "login rejected: no unique agent match");
            return Err(self.rejected(plain_password, true));
        }
        let id = ids[0];

        let hash = match self.store.fetch_password_hash(session, id) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(error = %e, "password hash fetch failed");
                return Err(self.rejected(plain_password, true));
            }
        };

        if !password::verify_password(&hash, plain_password) {
            debug!("login rejected: password verification failed");
            return Err(self.rejected(plain_password, false));
        }

        let agent = AgentIdentity {
            id,
            name: agent_name.to_string(),
        };
        counter!(LOGIN_SUCCESS).increment(1);
        debug!(agent = %agent.name, id = %agent.id, "login succeeded");
        Ok(self.issuer.issue(&agent))
    }

    fn disconnect(&mut self) {
        match std::mem::replace(&mut self.state, SessionState::Disconnected) {
            SessionState::Ready(session) => {
                if let Err(e) = self.store.close(session) {
                    warn!(error = %e, "error closing store session");
                }
            }
            SessionState::Uninitialized => {
                debug!("disconnect on uninitialized authenticator is a no-op");
            }
            SessionState::Disconnected => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::*;
    use crate::auth::token::RandomTokenIssuer;

    /// Store whose connect always fails.
    struct UnreachableStore;

    impl CredentialStore for UnreachableStore {
        type Session = ();

        fn connect(&self, _resource: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("store is down".into()))
        }
        fn ensure_schema(&self, _s: &()) -> Result<(), StoreError> {
            Ok(())
        }
        fn find_principals(&self, _s: &(), _n: &str, _t: &str) -> Result<Vec<Uuid>, StoreError> {
            Ok(Vec::new())
        }
        fn fetch_password_hash(&self, _s: &(), _id: Uuid) -> Result<String, StoreError> {
            Err(StoreError::NotFound)
        }
        fn close(&self, _s: ()) -> Result<(), StoreError> {
            Ok(())
        }
    }

    /// In-memory store with fixed records.
    #[derive(Default)]
    struct MemoryStore {
        agents: Vec<(Uuid, String)>,
        hashes: HashMap<Uuid, String>,
    }

    impl CredentialStore for MemoryStore {
        type Session = ();

        fn connect(&self, _resource: &str) -> Result<(), StoreError> {
            Ok(())
        }
        fn ensure_schema(&self, _s: &()) -> Result<(), StoreError> {
            Ok(())
        }
        fn find_principals(
            &self,
            _s: &(),
            name: &str,
            principal_type: &str,
        ) -> Result<Vec<Uuid>, StoreError> {
            if principal_type != AGENT_TYPE {
                return Ok(Vec::new());
            }
            Ok(self
                .agents
                .iter()
                .filter(|(_, n)| n == name)
                .map(|(id, _)| *id)
                .collect())
        }
        fn fetch_password_hash(&self, _s: &(), id: Uuid) -> Result<String, StoreError> {
            self.hashes.get(&id).cloned().ok_or(StoreError::NotFound)
        }
        fn close(&self, _s: ()) -> Result<(), StoreError> {
            Ok(())
        }
    }

    /// Issuer that counts its calls and remembers the last identity.
    #[derive(Clone, Default)]
    struct CountingIssuer {
        calls: Rc<Cell<usize>>,
        last_id: Rc<Cell<Option<Uuid>>>,
    }

    impl TokenIssuer for CountingIssuer {
        fn issue(&self, agent: &AgentIdentity) -> Token {
            self.calls.set(self.calls.get() + 1);
            self.last_id.set(Some(agent.id));
            Token::new(format!("token-for-{}", agent.name))
        }
    }

    fn fast() -> Argon2Settings {
        Argon2Settings {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn empty_inputs_are_rejected_before_the_store_is_touched() {
        // UnreachableStore would turn any store traffic into an Init error.
        let mut engine = AuthEngine::new(UnreachableStore, RandomTokenIssuer::default());
        assert!(matches!(
            engine.login("", "x", "unused"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            engine.login("alice", "", "unused"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn implicit_initialize_failure_surfaces_as_init_error() {
        let mut engine = AuthEngine::new(UnreachableStore, RandomTokenIssuer::default());
        let err = engine.login("alice", "pw", "unused").unwrap_err();
        assert!(err.is_init_failure());
    }

    #[test]
    fn disconnect_on_uninitialized_engine_is_a_noop() {
        let mut engine = AuthEngine::new(MemoryStore::default(), RandomTokenIssuer::default());
        engine.disconnect();
        engine.disconnect();
        assert!(!engine.is_ready());
    }

    #[test]
    fn login_reinitializes_after_disconnect() {
        let id = Uuid::new_v4();
        let hash = password::hash_password_with(&fast(), "correct-pw").unwrap();
        let store = MemoryStore {
            agents: vec![(id, "alice".into())],
            hashes: HashMap::from([(id, hash)]),
        };
        let issuer = CountingIssuer::default();
        let mut engine = AuthEngine::with_settings(store, issuer.clone(), fast());

        engine.login("alice", "correct-pw", "unused").unwrap();
        engine.disconnect();
        assert!(!engine.is_ready());

        engine.login("alice", "correct-pw", "unused").unwrap();
        assert!(engine.is_ready());
        assert_eq!(issuer.calls.get(), 2);
    }

    #[test]
    fn issuer_is_called_exactly_once_with_the_matched_identifier() {
        let id = Uuid::new_v4();
        let hash = password::hash_password_with(&fast(), "correct-pw").unwrap();
        let store = MemoryStore {
            agents: vec![(id, "alice".into())],
            hashes: HashMap::from([(id, hash)]),
        };
        let issuer = CountingIssuer::default();
        let mut engine = AuthEngine::with_settings(store, issuer.clone(), fast());

        let token = engine.login("alice", "correct-pw", "unused").unwrap();
        assert!(!token.is_empty());
        assert_eq!(issuer.calls.get(), 1);
        assert_eq!(issuer.last_id.get(), Some(id));

        // A rejected login must not reach the issuer.
        let _ = engine.login("alice", "wrong-pw", "unused");
        assert_eq!(issuer.calls.get(), 1);
    }

    #[test]
    fn missing_hash_record_collapses_to_invalid_credentials() {
        let id = Uuid::new_v4();
        let store = MemoryStore {
            agents: vec![(id, "alice".into())],
            hashes: HashMap::new(),
        };
        let mut engine =
            AuthEngine::with_settings(store, RandomTokenIssuer::default(), fast());
        assert!(matches!(
            engine.login("alice", "pw", "unused"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn duplicate_agent_names_collapse_to_invalid_credentials() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let hash = password::hash_password_with(&fast(), "correct-pw").unwrap();
        let store = MemoryStore {
            agents: vec![(a, "alice".into()), (b, "alice".into())],
            hashes: HashMap::from([(a, hash.clone()), (b, hash)]),
        };
        let mut engine =
            AuthEngine::with_settings(store, RandomTokenIssuer::default(), fast());
        assert!(matches!(
            engine.login("alice", "correct-pw", "unused"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
