//! Error types for certificate trust decisions.

use thiserror::Error;

use crate::outcome::TrustOutcome;

/// Reasons a certificate must not be relied upon.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrustError {
    /// Numeric code outside the closed outcome set
    #[error("Trust outcome code must be between 0 and 10: {0}")]
    InvalidCode(u8),

    /// Certificate is not a decodable X.509 structure
    #[error("Certificate encoding is invalid")]
    Encoding,

    #[error("Certificate is not yet valid")]
    NotYetValid,

    #[error("Certificate has expired")]
    Expired,

    /// Any other non-valid outcome
    #[error("Certificate is not trusted ({outcome}): {reason}")]
    Untrusted { outcome: TrustOutcome, reason: String },
}

/// Result type for trust decisions.
pub type TrustResult<T> = Result<T, TrustError>;
