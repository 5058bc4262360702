//! DER-encoded X.509 certificate values.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fingerprint::{Fingerprint, FingerprintAlgorithm};

/// An X.509 certificate held in its DER encoding.
///
/// The bytes are owned; cloning yields an independent copy. Parsing is left
/// to consumers that need field-level access (see `signcore-validation`).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Certificate {
    #[serde(with = "hex")]
    der: Vec<u8>,
}

impl Certificate {
    pub fn from_der(der: impl Into<Vec<u8>>) -> Self {
        Self { der: der.into() }
    }

    /// Decode a hex string holding DER bytes.
    pub fn from_hex(encoded: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self::from_der(hex::decode(encoded.trim())?))
    }

    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    pub fn into_der(self) -> Vec<u8> {
        self.der
    }

    pub fn fingerprint(&self, algorithm: FingerprintAlgorithm) -> Fingerprint {
        algorithm.digest(&self.der)
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("der_len", &self.der.len())
            .field("sha1", &self.fingerprint(FingerprintAlgorithm::Sha1).as_str())
            .finish()
    }
}
