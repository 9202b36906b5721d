// ============================
// crates/engine/src/config.rs
// ============================
//! Configuration management.
use std::path::{Path, PathBuf};

use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::auth::password::{Argon2Settings, PasswordRequirements};

/// Engine settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path of the credential store (passed to `connect` as the resource hint)
    pub store_path: PathBuf,
    /// Log level
    pub log_level: String,
    /// Entropy of issued tokens, in bytes
    pub token_bytes: usize,
    /// Argon2 cost parameters used when provisioning new credentials
    pub argon2: Argon2Settings,
    /// Password complexity requirements applied at provisioning time
    pub password_requirements: PasswordRequirements,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("data/credstore"),
            log_level: "info".to_string(),
            token_bytes: 32,
            argon2: Argon2Settings::default(),
            password_requirements: PasswordRequirements::default(),
        }
    }
}

impl Settings {
    /// Load settings from `credgate.toml` and `CREDGATE_`-prefixed
    /// environment variables, the latter taking precedence.
    pub fn load() -> Result<Self> {
        Self::load_from("credgate.toml")
    }

    /// Load settings from an explicit TOML file plus the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let settings = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("CREDGATE_").split("__"))
            .extract()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let s = Settings::default();
        assert_eq!(s.store_path, PathBuf::from("data/credstore"));
        assert_eq!(s.token_bytes, 32);
        assert!(s.argon2.memory_kib > 0);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        // Figment treats an absent TOML file as an empty provider.
        let s = Settings::load_from("does-not-exist.toml").unwrap();
        assert_eq!(s.log_level, "info");
    }
}
