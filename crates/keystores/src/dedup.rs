//! Cross-source duplicate suppression.
//!
//! When a preferred source joins an aggregate, every certificate it exposes is
//! fingerprinted and matching aliases in the sources that are *already* present
//! get deactivated. Sources added later are not revisited; the caller controls
//! the outcome through the order of `add` calls.

use std::collections::HashSet;
use tracing::{info, warn};

use crate::fingerprint::{Fingerprint, FingerprintAlgorithm};
use crate::source::CredentialSource;

/// One alias to hide in an existing source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deactivation {
    /// Position of the source in the aggregate (addition order)
    pub source_index: usize,
    pub alias: String,
    pub fingerprint: Fingerprint,
}

/// Compute which aliases of `existing` duplicate a certificate of `preferred`.
///
/// Pure with respect to the sources: nothing is deactivated here. Aliases whose
/// certificate cannot be fetched are skipped on either side.
pub fn plan_deduplication(
    existing: &[Box<dyn CredentialSource>],
    preferred: &dyn CredentialSource,
    algorithm: FingerprintAlgorithm,
) -> Vec<Deactivation> {
    let preferred_fingerprints = fingerprints_of(preferred, algorithm);
    if preferred_fingerprints.is_empty() {
        return Vec::new();
    }

    let mut plan = Vec::new();
    for (source_index, source) in existing.iter().enumerate() {
        for alias in source.aliases() {
            let Some(certificate) = source.certificate(&alias) else {
                warn!(
                    source = source.name(),
                    alias = %alias,
                    "Certificate unavailable, duplicate check skipped for alias"
                );
                continue;
            };
            let fingerprint = certificate.fingerprint(algorithm);
            if preferred_fingerprints.contains(&fingerprint) {
                plan.push(Deactivation {
                    source_index,
                    alias,
                    fingerprint,
                });
            }
        }
    }
    plan
}

fn fingerprints_of(
    source: &dyn CredentialSource,
    algorithm: FingerprintAlgorithm,
) -> HashSet<Fingerprint> {
    let mut fingerprints = HashSet::new();
    for alias in source.aliases() {
        match source.certificate(&alias) {
            Some(certificate) => {
                let fingerprint = certificate.fingerprint(algorithm);
                info!(
                    source = source.name(),
                    fingerprint = %fingerprint,
                    "Certificate will only be taken from the preferred source"
                );
                fingerprints.insert(fingerprint);
            }
            None => warn!(
                source = source.name(),
                alias = %alias,
                "Could not fingerprint certificate, duplicates may remain"
            ),
        }
    }
    fingerprints
}
