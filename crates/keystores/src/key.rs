//! Private key handles exposed by credential sources.

use p256::ecdsa::signature::Signer as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::certificate::Certificate;

/// Algorithm of a software-held private key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    P256,
    Ed25519,
}

/// Private key material held in process memory.
///
/// Both variants zeroize their secret scalar on drop. `Debug` only reveals the
/// algorithm.
pub enum SoftwareKey {
    P256(p256::ecdsa::SigningKey),
    Ed25519(ed25519_dalek::SigningKey),
}

impl SoftwareKey {
    /// Decode a raw secret (32-byte scalar or seed).
    pub fn from_secret(algorithm: KeyAlgorithm, secret: &[u8]) -> Result<Self, String> {
        match algorithm {
            KeyAlgorithm::P256 => p256::ecdsa::SigningKey::from_slice(secret)
                .map(SoftwareKey::P256)
                .map_err(|_| "invalid P-256 secret scalar".to_string()),
            KeyAlgorithm::Ed25519 => {
                let seed: Zeroizing<[u8; 32]> = Zeroizing::new(
                    secret
                        .try_into()
                        .map_err(|_| format!("Ed25519 seed must be 32 bytes, got {}", secret.len()))?,
                );
                Ok(SoftwareKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(&seed)))
            }
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            SoftwareKey::P256(_) => KeyAlgorithm::P256,
            SoftwareKey::Ed25519(_) => KeyAlgorithm::Ed25519,
        }
    }

    /// Sign `message`. P-256 signatures are DER encoded, Ed25519 signatures are raw 64 bytes.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            SoftwareKey::P256(key) => {
                let signature: p256::ecdsa::Signature = key.sign(message);
                signature.to_der().as_bytes().to_vec()
            }
            SoftwareKey::Ed25519(key) => ed25519_dalek::Signer::sign(key, message).to_bytes().to_vec(),
        }
    }

    /// Public key bytes (SEC1 compressed point or raw Ed25519 key).
    pub fn public_key(&self) -> Vec<u8> {
        match self {
            SoftwareKey::P256(key) => key
                .verifying_key()
                .to_encoded_point(true)
                .as_bytes()
                .to_vec(),
            SoftwareKey::Ed25519(key) => key.verifying_key().to_bytes().to_vec(),
        }
    }
}

impl fmt::Debug for SoftwareKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareKey")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

/// Reference to a private key usable for signing.
#[derive(Debug, Clone)]
pub enum KeyHandle {
    /// Key material loaded into memory from a software store
    Software(Arc<SoftwareKey>),
    /// Key resident on a hardware token, addressed by its on-card reference
    Token { token: String, key_reference: u8 },
}

impl KeyHandle {
    pub fn is_hardware(&self) -> bool {
        matches!(self, KeyHandle::Token { .. })
    }
}

/// A private key together with its certificate chain (leaf first).
#[derive(Debug, Clone)]
pub struct PrivateKeyEntry {
    pub alias: String,
    pub key: KeyHandle,
    pub chain: Vec<Certificate>,
}

impl PrivateKeyEntry {
    pub fn certificate(&self) -> Option<&Certificate> {
        self.chain.first()
    }
}
