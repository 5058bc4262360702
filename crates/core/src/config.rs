//! Configuration management for signcore.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub keystores: KeystoreConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystoreConfig {
    /// Digest used to detect the same certificate in several stores
    pub fingerprint_algorithm: String,
    /// Software stores in lookup priority order; the first one is the primary
    pub software: Vec<SoftwareStoreConfig>,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            fingerprint_algorithm: "sha1".to_string(),
            software: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SoftwareStoreConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub preferred: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Accepted issuer distinguished names; empty accepts any issuer
    pub allowed_issuers: Vec<String>,
    /// Revoked certificate serials, hex encoded
    pub revoked_serials: Vec<String>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    fn check(&self) -> Result<()> {
        if self.keystores.fingerprint_algorithm.trim().is_empty() {
            return Err(CoreError::Config(
                "keystores.fingerprint_algorithm must not be empty".to_string(),
            ));
        }
        if let Some(store) = self
            .keystores
            .software
            .iter()
            .find(|s| s.path.as_os_str().is_empty())
        {
            return Err(CoreError::Config(format!(
                "software store path must not be empty (preferred = {})",
                store.preferred
            )));
        }
        Ok(())
    }
}
