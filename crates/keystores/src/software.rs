//! File-backed software credential store.
//!
//! The store is a JSON document listing entries in order:
//!
//! ```json
//! { "entries": [ { "alias": "signing",
//!                  "certificate": "<hex DER>",
//!                  "chain": ["<hex DER issuer>"],
//!                  "key": { "algorithm": "p256", "secret": "<hex>" } } ] }
//! ```
//!
//! Deactivating an alias suppresses the certificate it held at that moment.
//! The suppression survives `reload` and follows the certificate, so a
//! duplicate stays hidden even under a new alias while a different
//! certificate stored under the old alias shows up again.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::certificate::Certificate;
use crate::error::{KeystoreError, KeystoreResult};
use crate::key::{KeyAlgorithm, KeyHandle, PrivateKeyEntry, SoftwareKey};
use crate::source::{CredentialSource, SourceKind};

/// Serialized form of a private key inside a store file.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct StoredKey {
    #[zeroize(skip)]
    pub algorithm: KeyAlgorithm,
    /// Hex-encoded secret scalar or seed
    pub secret: String,
}

/// One entry of a store file.
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    pub alias: String,
    pub certificate: Certificate,
    /// Issuer certificates, closest issuer first
    #[serde(default)]
    pub chain: Vec<Certificate>,
    #[serde(default)]
    pub key: Option<StoredKey>,
}

impl StoredEntry {
    pub fn certificate_only(alias: impl Into<String>, certificate: Certificate) -> Self {
        Self {
            alias: alias.into(),
            certificate,
            chain: Vec::new(),
            key: None,
        }
    }

    pub fn with_key(
        alias: impl Into<String>,
        certificate: Certificate,
        chain: Vec<Certificate>,
        algorithm: KeyAlgorithm,
        secret: &[u8],
    ) -> Self {
        Self {
            alias: alias.into(),
            certificate,
            chain,
            key: Some(StoredKey {
                algorithm,
                secret: hex::encode(secret),
            }),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    entries: Vec<StoredEntry>,
}

#[derive(Debug)]
struct LoadedEntry {
    alias: String,
    /// Leaf first
    chain: Vec<Certificate>,
    key: Option<Arc<SoftwareKey>>,
}

enum Backing {
    File(PathBuf),
    Memory(Vec<StoredEntry>),
}

/// Software certificate container.
pub struct SoftwareStore {
    name: String,
    backing: Backing,
    preferred: bool,
    entries: Vec<LoadedEntry>,
    suppressed: HashSet<Certificate>,
}

impl SoftwareStore {
    /// Open a store file.
    pub fn open(path: impl AsRef<Path>, preferred: bool) -> KeystoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = load_file(&path)?;
        info!(
            store = %path.display(),
            entries = entries.len(),
            preferred,
            "Software credential store loaded"
        );
        Ok(Self {
            name: path.display().to_string(),
            backing: Backing::File(path),
            preferred,
            entries,
            suppressed: HashSet::new(),
        })
    }

    /// Build an in-memory store. `reload` restores these entries.
    ///
    /// Entries whose key cannot be decoded are kept as certificate-only entries.
    pub fn from_entries(name: impl Into<String>, entries: Vec<StoredEntry>, preferred: bool) -> Self {
        let name = name.into();
        let loaded = decode_lenient(&name, &entries);
        Self {
            name,
            backing: Backing::Memory(entries),
            preferred,
            entries: loaded,
            suppressed: HashSet::new(),
        }
    }

    /// Persist entries as a store file readable by [`SoftwareStore::open`].
    pub fn write_file(path: impl AsRef<Path>, entries: Vec<StoredEntry>) -> KeystoreResult<()> {
        let content = serde_json::to_vec_pretty(&StoreFile { entries })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn is_suppressed(&self, entry: &LoadedEntry) -> bool {
        entry
            .chain
            .first()
            .is_some_and(|leaf| self.suppressed.contains(leaf))
    }

    fn active(&self, alias: &str) -> Option<&LoadedEntry> {
        self.entries
            .iter()
            .find(|e| e.alias == alias)
            .filter(|e| !self.is_suppressed(e))
    }
}

impl CredentialSource for SoftwareStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Software
    }

    fn aliases(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !self.is_suppressed(e))
            .map(|e| e.alias.clone())
            .collect()
    }

    fn certificate(&self, alias: &str) -> Option<Certificate> {
        self.active(alias).and_then(|e| e.chain.first().cloned())
    }

    fn certificate_chain(&self, alias: &str) -> Option<Vec<Certificate>> {
        self.active(alias).map(|e| e.chain.clone())
    }

    fn key_entry(&self, alias: &str) -> KeystoreResult<Option<PrivateKeyEntry>> {
        Ok(self.active(alias).and_then(|entry| {
            entry.key.as_ref().map(|key| PrivateKeyEntry {
                alias: entry.alias.clone(),
                key: KeyHandle::Software(Arc::clone(key)),
                chain: entry.chain.clone(),
            })
        }))
    }

    fn is_key_entry(&self, alias: &str) -> KeystoreResult<bool> {
        self.active(alias)
            .map(|e| e.key.is_some())
            .ok_or_else(|| KeystoreError::AliasNotPresent {
                alias: alias.to_string(),
            })
    }

    fn deactivate(&mut self, alias: &str) {
        let Some(leaf) = self.active(alias).and_then(|e| e.chain.first().cloned()) else {
            debug!(store = %self.name, alias, "Nothing to deactivate for alias");
            return;
        };
        debug!(store = %self.name, alias, "Alias deactivated");
        self.suppressed.insert(leaf);
    }

    fn reload(&mut self) -> KeystoreResult<()> {
        let entries = match &self.backing {
            Backing::File(path) => load_file(path).map_err(|e| KeystoreError::Reload {
                source_name: self.name.clone(),
                reason: e.to_string(),
            })?,
            Backing::Memory(seed) => decode_lenient(&self.name, seed),
        };
        self.entries = entries;
        debug!(store = %self.name, entries = self.entries.len(), "Software store reloaded");
        Ok(())
    }

    fn is_preferred(&self) -> bool {
        self.preferred
    }
}

fn load_file(path: &Path) -> KeystoreResult<Vec<LoadedEntry>> {
    let content = std::fs::read(path)?;
    let file: StoreFile = serde_json::from_slice(&content)?;

    let mut seen = HashSet::new();
    for entry in &file.entries {
        if !seen.insert(entry.alias.as_str()) {
            return Err(KeystoreError::Malformed(format!(
                "duplicate alias '{}' in {}",
                entry.alias,
                path.display()
            )));
        }
    }

    file.entries.iter().map(decode_entry).collect()
}

fn decode_entry(entry: &StoredEntry) -> KeystoreResult<LoadedEntry> {
    let key = match &entry.key {
        Some(stored) => {
            let secret = Zeroizing::new(hex::decode(stored.secret.trim()).map_err(|e| {
                KeystoreError::InvalidKey {
                    alias: entry.alias.clone(),
                    reason: e.to_string(),
                }
            })?);
            let key = SoftwareKey::from_secret(stored.algorithm, &secret).map_err(|reason| {
                KeystoreError::InvalidKey {
                    alias: entry.alias.clone(),
                    reason,
                }
            })?;
            Some(Arc::new(key))
        }
        None => None,
    };

    Ok(LoadedEntry {
        alias: entry.alias.clone(),
        chain: leaf_first(entry),
        key,
    })
}

fn decode_lenient(store: &str, entries: &[StoredEntry]) -> Vec<LoadedEntry> {
    entries
        .iter()
        .map(|entry| {
            decode_entry(entry).unwrap_or_else(|e| {
                debug!(store, error = %e, "Dropping undecodable key");
                LoadedEntry {
                    alias: entry.alias.clone(),
                    chain: leaf_first(entry),
                    key: None,
                }
            })
        })
        .collect()
}

fn leaf_first(entry: &StoredEntry) -> Vec<Certificate> {
    std::iter::once(entry.certificate.clone())
        .chain(entry.chain.iter().cloned())
        .collect()
}
