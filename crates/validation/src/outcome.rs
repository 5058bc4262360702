//! Closed classification of certificate validation results.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{TrustError, TrustResult};

/// Outcome of validating a certificate.
///
/// Each variant has a stable numeric code. Only [`TrustOutcome::Valid`] means
/// the certificate may be used; [`TrustOutcome::enforce`] turns every other
/// outcome into an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum TrustOutcome {
    Valid = 0,
    /// Not an X.509 structure, or corrupt
    Corrupt = 1,
    /// Issuer is not among the supported authorities
    UnsupportedIssuer = 2,
    NotYetValid = 3,
    Expired = 4,
    Revoked = 5,
    /// Status could not be determined
    Unknown = 6,
    /// Internal or OCSP responder failure
    ServerError = 7,
    Unauthorized = 8,
    MalformedRequest = 9,
    /// Responder requires signed requests
    SignatureRequired = 10,
}

impl TrustOutcome {
    pub const ALL: [TrustOutcome; 11] = [
        TrustOutcome::Valid,
        TrustOutcome::Corrupt,
        TrustOutcome::UnsupportedIssuer,
        TrustOutcome::NotYetValid,
        TrustOutcome::Expired,
        TrustOutcome::Revoked,
        TrustOutcome::Unknown,
        TrustOutcome::ServerError,
        TrustOutcome::Unauthorized,
        TrustOutcome::MalformedRequest,
        TrustOutcome::SignatureRequired,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn description(self) -> &'static str {
        match self {
            TrustOutcome::Valid => "Valid",
            TrustOutcome::Corrupt => "Not a compatible X.509 certificate or corrupt",
            TrustOutcome::UnsupportedIssuer => "Not issued by a supported CA",
            TrustOutcome::NotYetValid => "Not yet valid",
            TrustOutcome::Expired => "Expired",
            TrustOutcome::Revoked => "Revoked",
            TrustOutcome::Unknown => "Unknown",
            TrustOutcome::ServerError => "Internal or OCSP server error",
            TrustOutcome::Unauthorized => "Unauthorized",
            TrustOutcome::MalformedRequest => "Malformed OCSP request",
            TrustOutcome::SignatureRequired => "OCSP request is not signed",
        }
    }

    pub fn is_trusted(self) -> bool {
        matches!(self, TrustOutcome::Valid)
    }

    /// Fail unless the outcome is `Valid`.
    pub fn enforce(self) -> TrustResult<()> {
        match self {
            TrustOutcome::Valid => Ok(()),
            TrustOutcome::Corrupt => Err(TrustError::Encoding),
            TrustOutcome::NotYetValid => Err(TrustError::NotYetValid),
            TrustOutcome::Expired => Err(TrustError::Expired),
            TrustOutcome::UnsupportedIssuer => Err(self.untrusted("Certificate is not from a supported CA")),
            TrustOutcome::Revoked => Err(self.untrusted("Certificate revoked")),
            TrustOutcome::Unknown => Err(self.untrusted("Certificate validity unknown")),
            TrustOutcome::ServerError => {
                Err(self.untrusted("Internal or server error while validating the certificate"))
            }
            TrustOutcome::Unauthorized => Err(self.untrusted("Unauthorized")),
            TrustOutcome::MalformedRequest => Err(self.untrusted("Malformed OCSP request")),
            TrustOutcome::SignatureRequired => Err(self.untrusted("OCSP request is not signed")),
        }
    }

    fn untrusted(self, reason: &str) -> TrustError {
        TrustError::Untrusted {
            outcome: self,
            reason: reason.to_string(),
        }
    }

    pub fn report(self) -> TrustReport {
        TrustReport {
            ok: self.is_trusted(),
            reason: self.description().to_string(),
        }
    }
}

impl fmt::Display for TrustOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<TrustOutcome> for u8 {
    fn from(outcome: TrustOutcome) -> Self {
        outcome.code()
    }
}

impl TryFrom<u8> for TrustOutcome {
    type Error = TrustError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        TrustOutcome::ALL
            .get(usize::from(code))
            .copied()
            .ok_or(TrustError::InvalidCode(code))
    }
}

/// Two-field summary of an outcome for callers that prefer data to branching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustReport {
    pub ok: bool,
    pub reason: String,
}

impl TrustReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        for (index, outcome) in TrustOutcome::ALL.iter().enumerate() {
            assert_eq!(usize::from(outcome.code()), index);
            assert_eq!(TrustOutcome::try_from(outcome.code()).unwrap(), *outcome);
        }
        assert_eq!(TrustOutcome::Revoked.code(), 5);
        assert_eq!(TrustOutcome::SignatureRequired.code(), 10);
    }

    #[test]
    fn test_out_of_range_code_rejected() {
        assert_eq!(TrustOutcome::try_from(11), Err(TrustError::InvalidCode(11)));
        assert_eq!(TrustOutcome::try_from(255), Err(TrustError::InvalidCode(255)));
    }

    #[test]
    fn test_only_valid_is_trusted() {
        for outcome in TrustOutcome::ALL {
            assert_eq!(outcome.is_trusted(), outcome == TrustOutcome::Valid);
            assert_eq!(outcome.enforce().is_ok(), outcome == TrustOutcome::Valid);
        }
    }

    #[test]
    fn test_enforce_maps_specific_errors() {
        assert_eq!(TrustOutcome::Corrupt.enforce(), Err(TrustError::Encoding));
        assert_eq!(TrustOutcome::NotYetValid.enforce(), Err(TrustError::NotYetValid));
        assert_eq!(TrustOutcome::Expired.enforce(), Err(TrustError::Expired));

        match TrustOutcome::Revoked.enforce() {
            Err(TrustError::Untrusted { outcome, reason }) => {
                assert_eq!(outcome, TrustOutcome::Revoked);
                assert_eq!(reason, "Certificate revoked");
            }
            other => panic!("Unexpected enforcement result: {:?}", other),
        }
    }

    #[test]
    fn test_report() {
        assert_eq!(
            TrustOutcome::Valid.report(),
            TrustReport {
                ok: true,
                reason: "Valid".to_string()
            }
        );

        let report = TrustOutcome::Expired.report();
        assert!(!report.ok);
        assert_eq!(report.to_json().unwrap(), r#"{"ok":false,"reason":"Expired"}"#);
    }

    #[test]
    fn test_descriptions_are_distinct() {
        let mut descriptions: Vec<_> = TrustOutcome::ALL.iter().map(|o| o.description()).collect();
        descriptions.sort_unstable();
        descriptions.dedup();
        assert_eq!(descriptions.len(), TrustOutcome::ALL.len());
        assert_eq!(TrustOutcome::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn test_serializes_as_code() {
        assert_eq!(serde_json::to_string(&TrustOutcome::Revoked).unwrap(), "5");
        assert_eq!(
            serde_json::from_str::<TrustOutcome>("4").unwrap(),
            TrustOutcome::Expired
        );
        assert!(serde_json::from_str::<TrustOutcome>("42").is_err());
    }
}
