// ================
// common/src/lib.rs
// ================
//! Common types shared between the credential store, the authentication
//! engine, and the operator CLI.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Principal type value that makes an entity eligible to authenticate.
pub const AGENT_TYPE: &str = "Agent";

/// The two load-bearing property keys on a stored principal.
///
/// Principals carry an open-ended property set; authentication only ever
/// reads these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltInProperty {
    /// Display name; expected unique among Agent-typed principals.
    Name,
    /// Principal type; must equal [`AGENT_TYPE`] for login.
    Type,
}

impl BuiltInProperty {
    /// Property-map key for this built-in.
    pub fn key(self) -> &'static str {
        match self {
            BuiltInProperty::Name => "Name",
            BuiltInProperty::Type => "Type",
        }
    }
}

/// A stored entity: globally unique id plus named string properties.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Globally unique identifier.
    pub id: Uuid,
    /// Named properties; `Name` and `Type` are the load-bearing ones.
    pub properties: BTreeMap<String, String>,
}

impl Principal {
    /// Create a principal with the given id and properties.
    pub fn new(id: Uuid, properties: BTreeMap<String, String>) -> Self {
        Self { id, properties }
    }

    /// Create an Agent-typed principal with a fresh id.
    pub fn agent(name: &str) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(BuiltInProperty::Name.key().to_string(), name.to_string());
        properties.insert(BuiltInProperty::Type.key().to_string(), AGENT_TYPE.to_string());
        Self {
            id: Uuid::new_v4(),
            properties,
        }
    }

    /// Look up a property value by key.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// The `Name` property, if present.
    pub fn name(&self) -> Option<&str> {
        self.property(BuiltInProperty::Name.key())
    }

    /// The `Type` property, if present.
    pub fn principal_type(&self) -> Option<&str> {
        self.property(BuiltInProperty::Type.key())
    }

    /// Whether this principal matches a `{Name, Type}` lookup.
    pub fn matches(&self, name: &str, principal_type: &str) -> bool {
        self.name() == Some(name) && self.principal_type() == Some(principal_type)
    }
}

/// A verified principal identity, as handed to the token issuer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    /// Identifier of the matched principal.
    pub id: Uuid,
    /// Display name the principal authenticated under.
    pub name: String,
}

/// Opaque session credential returned on successful login.
///
/// The engine treats this as a black box minted by the token issuer; no
/// structure is promised beyond non-emptiness on success.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wrap an issued credential.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw credential.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the token, yielding the raw credential.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// True for a zero-length credential.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
