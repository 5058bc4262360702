//! Certificate fingerprints used for cross-source duplicate detection.

use serde::{Deserialize, Serialize};
use sha1::{Digest as _, Sha1};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

use crate::error::KeystoreError;

/// Digest algorithm applied to a certificate's DER encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintAlgorithm {
    #[default]
    Sha1,
    Sha256,
    Blake3,
}

impl FingerprintAlgorithm {
    pub fn digest(&self, data: &[u8]) -> Fingerprint {
        let bytes = match self {
            FingerprintAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            FingerprintAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            FingerprintAlgorithm::Blake3 => blake3::hash(data).as_bytes().to_vec(),
        };
        Fingerprint(hex::encode(bytes))
    }

    pub fn name(&self) -> &'static str {
        match self {
            FingerprintAlgorithm::Sha1 => "sha1",
            FingerprintAlgorithm::Sha256 => "sha256",
            FingerprintAlgorithm::Blake3 => "blake3",
        }
    }
}

impl FromStr for FingerprintAlgorithm {
    type Err = KeystoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(FingerprintAlgorithm::Sha1),
            "sha256" => Ok(FingerprintAlgorithm::Sha256),
            "blake3" => Ok(FingerprintAlgorithm::Blake3),
            _ => Err(KeystoreError::DigestUnavailable(s.to_string())),
        }
    }
}

impl fmt::Display for FingerprintAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lowercase hex digest of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1_known_vector() {
        let fp = FingerprintAlgorithm::Sha1.digest(b"abc");
        assert_eq!(fp.as_str(), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_sha256_known_vector() {
        let fp = FingerprintAlgorithm::Sha256.digest(b"abc");
        assert_eq!(
            fp.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_blake3_length() {
        let fp = FingerprintAlgorithm::Blake3.digest(b"abc");
        assert_eq!(fp.as_str().len(), 64);
    }

    #[test]
    fn test_parse_algorithm_names() {
        assert_eq!("SHA-1".parse::<FingerprintAlgorithm>().unwrap(), FingerprintAlgorithm::Sha1);
        assert_eq!("sha256".parse::<FingerprintAlgorithm>().unwrap(), FingerprintAlgorithm::Sha256);
        assert_eq!(" Blake3 ".parse::<FingerprintAlgorithm>().unwrap(), FingerprintAlgorithm::Blake3);
    }

    #[test]
    fn test_unknown_algorithm_is_unavailable() {
        let err = "md5".parse::<FingerprintAlgorithm>().unwrap_err();
        assert!(matches!(err, KeystoreError::DigestUnavailable(name) if name == "md5"));
    }

    #[test]
    fn test_different_data_different_fingerprint() {
        let a = FingerprintAlgorithm::Sha1.digest(&[1, 2, 3]);
        let b = FingerprintAlgorithm::Sha1.digest(&[1, 2, 4]);
        assert_ne!(a, b);
    }
}
