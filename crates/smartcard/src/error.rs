//! Error types for card communication and secure messaging.

use thiserror::Error;

/// Errors raised while building, wrapping or exchanging APDUs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmartcardError {
    /// Secure messaging MAC was not exactly four bytes
    #[error("MAC must be exactly 4 bytes, got {actual}")]
    InvalidMacLength { actual: usize },

    /// Expected response length cannot be changed on a protected frame
    #[error("Le cannot be set on a secure messaging APDU")]
    UnsupportedInSecureMessaging,

    /// Response failed the secure messaging integrity check
    #[error("Secure messaging integrity violation: {0}")]
    IntegrityViolation(String),

    /// An earlier integrity or transport failure ended the session
    #[error("Secure messaging session aborted")]
    SessionAborted,

    #[error("Card transport error: {0}")]
    Transport(String),

    #[error("Malformed card response: {0}")]
    MalformedResponse(String),

    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),

    /// Command data does not fit a short-length APDU
    #[error("APDU data too long for short encoding: {length} bytes")]
    ApduTooLong { length: usize },

    /// Send sequence counter would wrap around
    #[error("Send sequence counter exhausted")]
    CounterExhausted,
}

/// Result type for smart card operations.
pub type SmartcardResult<T> = Result<T, SmartcardError>;
