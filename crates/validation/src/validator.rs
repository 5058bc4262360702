//! Certificate validators and the trust gate used before signing.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use x509_parser::parse_x509_certificate;

use crate::error::TrustResult;
use crate::outcome::TrustOutcome;
use signcore_core::ValidationConfig;
use signcore_keystores::Certificate;

/// Something able to classify a certificate.
pub trait CertificateValidator: Send + Sync {
    fn validate(&self, certificate: &Certificate) -> TrustOutcome;
}

/// Validate `certificate` and fail closed on anything but `Valid`.
pub fn require_trusted(
    validator: &dyn CertificateValidator,
    certificate: &Certificate,
) -> TrustResult<()> {
    let outcome = validator.validate(certificate);
    if outcome.is_trusted() {
        info!(certificate = ?certificate, "Certificate validated");
    } else {
        warn!(
            certificate = ?certificate,
            code = outcome.code(),
            outcome = %outcome,
            "Certificate rejected"
        );
    }
    outcome.enforce()
}

/// Offline validator working from the certificate's own fields.
///
/// Checks, in order: DER structure, issuer allow-list, revoked serials and the
/// validity window. An empty allow-list accepts every issuer.
#[derive(Debug, Clone, Default)]
pub struct LocalValidator {
    allowed_issuers: HashSet<String>,
    revoked_serials: HashSet<String>,
}

impl LocalValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        let mut validator = Self::new();
        for issuer in &config.allowed_issuers {
            validator.allow_issuer(issuer);
        }
        for serial in &config.revoked_serials {
            validator.revoke_serial(serial);
        }
        validator
    }

    /// Accept certificates whose issuer name renders as `issuer`
    /// (e.g. `CN=Signing CA, O=Example`).
    pub fn allow_issuer(&mut self, issuer: &str) {
        self.allowed_issuers.insert(issuer.trim().to_string());
    }

    /// Mark a serial number, hex encoded with optional `:` separators, as revoked.
    pub fn revoke_serial(&mut self, serial: &str) {
        self.revoked_serials.insert(normalize_serial(serial));
    }

    /// Classify `certificate` as of `now` (seconds since the Unix epoch).
    pub fn validate_at(&self, certificate: &Certificate, now: i64) -> TrustOutcome {
        let parsed = match parse_x509_certificate(certificate.as_der()) {
            Ok((_, parsed)) => parsed,
            Err(e) => {
                debug!(error = %e, "Certificate could not be decoded");
                return TrustOutcome::Corrupt;
            }
        };

        if !self.allowed_issuers.is_empty() {
            let issuer = parsed.issuer().to_string();
            if !self.allowed_issuers.contains(issuer.as_str()) {
                debug!(issuer = %issuer, "Issuer not in allow-list");
                return TrustOutcome::UnsupportedIssuer;
            }
        }

        let serial = normalize_serial(&hex::encode(parsed.raw_serial()));
        if self.revoked_serials.contains(&serial) {
            return TrustOutcome::Revoked;
        }

        let validity = parsed.validity();
        if now < validity.not_before.timestamp() {
            return TrustOutcome::NotYetValid;
        }
        if now > validity.not_after.timestamp() {
            return TrustOutcome::Expired;
        }
        TrustOutcome::Valid
    }
}

impl CertificateValidator for LocalValidator {
    fn validate(&self, certificate: &Certificate) -> TrustOutcome {
        self.validate_at(certificate, unix_now())
    }
}

fn normalize_serial(serial: &str) -> String {
    let digits: String = serial
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
