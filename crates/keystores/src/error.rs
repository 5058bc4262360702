//! Error types for credential store operations.

use thiserror::Error;

/// Errors that can occur while reading or aggregating credential sources.
#[derive(Debug, Error)]
pub enum KeystoreError {
    /// The aggregate was built without its mandatory primary source
    #[error("Primary credential source must be present")]
    MissingPrimarySource,

    /// Asked about an alias that no source exposes
    #[error("Alias '{alias}' is not present in any credential source")]
    AliasNotPresent { alias: String },

    /// Fingerprint digest could not be instantiated
    #[error("Digest algorithm unavailable: {0}")]
    DigestUnavailable(String),

    /// A source failed to reload from its backing storage
    #[error("Failed to reload credential source '{source_name}': {reason}")]
    Reload { source_name: String, reason: String },

    /// Private key material could not be decoded or used
    #[error("Invalid key for alias '{alias}': {reason}")]
    InvalidKey { alias: String, reason: String },

    /// Hardware token could not be read
    #[error("Token access failed: {0}")]
    Token(String),

    /// Store content is not well formed
    #[error("Malformed credential store: {0}")]
    Malformed(String),

    /// Shared aggregate lock was poisoned by a panicking writer
    #[error("Credential aggregate lock poisoned: {0}")]
    LockPoisoned(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for credential store operations.
pub type KeystoreResult<T> = Result<T, KeystoreError>;
