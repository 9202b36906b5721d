// ============================
// crates/engine/src/auth/token.rs
// ============================
//! Session-token issuance.
//!
//! The engine treats the issuer as an external collaborator: it calls
//! [`TokenIssuer::issue`] exactly once, after password verification, and
//! returns the result unmodified. [`RandomTokenIssuer`] is the default
//! implementation, minting unstructured bearer tokens from OS entropy.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use credgate_common::{AgentIdentity, Token};
use rand::{rngs::OsRng, RngCore};

/// Default token size in bytes (32 bytes = 256 bits of entropy)
const DEFAULT_TOKEN_BYTES: usize = 32;

/// Mints the session credential for a verified principal identity.
pub trait TokenIssuer {
    /// Produce a token for a verified identity.
    fn issue(&self, agent: &AgentIdentity) -> Token;
}

/// Issues cryptographically random bearer tokens, base64 URL-safe encoded
/// without padding.
#[derive(Debug, Clone)]
pub struct RandomTokenIssuer {
    bytes: usize,
}

impl RandomTokenIssuer {
    /// Issuer producing tokens with `bytes` bytes of entropy.
    pub fn new(bytes: usize) -> Self {
        Self { bytes }
    }
}

impl Default for RandomTokenIssuer {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_BYTES)
    }
}

impl TokenIssuer for RandomTokenIssuer {
    fn issue(&self, _agent: &AgentIdentity) -> Token {
        let mut buffer = vec![0u8; self.bytes];
        OsRng.fill_bytes(&mut buffer);
        Token::new(URL_SAFE_NO_PAD.encode(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn agent() -> AgentIdentity {
        AgentIdentity {
            id: Uuid::new_v4(),
            name: "alice".to_string(),
        }
    }

    #[test]
    fn tokens_are_unique() {
        let issuer = RandomTokenIssuer::default();
        let t1 = issuer.issue(&agent());
        let t2 = issuer.issue(&agent());
        assert_ne!(t1, t2);

        // 32 bytes of entropy encoded in base64, about 43-44 chars
        assert!(t1.as_str().len() >= 42);
    }

    #[test]
    fn token_size_is_configurable() {
        let small = RandomTokenIssuer::new(16).issue(&agent());
        let default = RandomTokenIssuer::default().issue(&agent());
        let large = RandomTokenIssuer::new(64).issue(&agent());

        assert!(small.as_str().len() < default.as_str().len());
        assert!(large.as_str().len() > default.as_str().len());
    }
}
