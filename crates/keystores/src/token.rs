//! Hardware-token credential store.
//!
//! Certificates are read from the token through a [`TokenReader`]; private keys
//! never leave the device and are exposed as [`KeyHandle::Token`] references.

use std::collections::HashSet;
use tracing::{debug, info};

use crate::certificate::Certificate;
use crate::error::{KeystoreError, KeystoreResult};
use crate::key::{KeyHandle, PrivateKeyEntry};
use crate::source::{CredentialSource, SourceKind};

/// A certificate object found on a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenObject {
    pub alias: String,
    pub certificate: Certificate,
    /// Issuer certificates, closest issuer first
    pub chain: Vec<Certificate>,
    /// On-card reference of the matching private key, if any
    pub key_reference: Option<u8>,
}

/// Access to the objects stored on one token.
pub trait TokenReader: Send + Sync {
    /// Label identifying the token (serial number, reader name).
    fn label(&self) -> &str;

    fn read_objects(&mut self) -> KeystoreResult<Vec<TokenObject>>;
}

/// Credential source backed by a hardware token.
pub struct TokenStore<R: TokenReader> {
    reader: R,
    preferred: bool,
    objects: Vec<TokenObject>,
    /// Certificates hidden by `deactivate`, kept across reloads
    suppressed: HashSet<Certificate>,
}

impl<R: TokenReader> TokenStore<R> {
    /// Read the token's objects and build the store.
    pub fn open(mut reader: R, preferred: bool) -> KeystoreResult<Self> {
        let objects = reader.read_objects()?;
        info!(
            token = reader.label(),
            objects = objects.len(),
            preferred,
            "Token credential store opened"
        );
        Ok(Self {
            reader,
            preferred,
            objects,
            suppressed: HashSet::new(),
        })
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    fn active(&self, alias: &str) -> Option<&TokenObject> {
        self.objects
            .iter()
            .find(|o| o.alias == alias)
            .filter(|o| !self.suppressed.contains(&o.certificate))
    }
}

impl<R: TokenReader> CredentialSource for TokenStore<R> {
    fn name(&self) -> &str {
        self.reader.label()
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Token
    }

    fn aliases(&self) -> Vec<String> {
        self.objects
            .iter()
            .filter(|o| !self.suppressed.contains(&o.certificate))
            .map(|o| o.alias.clone())
            .collect()
    }

    fn certificate(&self, alias: &str) -> Option<Certificate> {
        self.active(alias).map(|o| o.certificate.clone())
    }

    fn certificate_chain(&self, alias: &str) -> Option<Vec<Certificate>> {
        self.active(alias).map(|o| {
            std::iter::once(o.certificate.clone())
                .chain(o.chain.iter().cloned())
                .collect()
        })
    }

    fn key_entry(&self, alias: &str) -> KeystoreResult<Option<PrivateKeyEntry>> {
        let Some(object) = self.active(alias) else {
            return Ok(None);
        };
        Ok(object.key_reference.map(|key_reference| PrivateKeyEntry {
            alias: object.alias.clone(),
            key: KeyHandle::Token {
                token: self.reader.label().to_string(),
                key_reference,
            },
            chain: std::iter::once(object.certificate.clone())
                .chain(object.chain.iter().cloned())
                .collect(),
        }))
    }

    fn is_key_entry(&self, alias: &str) -> KeystoreResult<bool> {
        self.active(alias)
            .map(|o| o.key_reference.is_some())
            .ok_or_else(|| KeystoreError::AliasNotPresent {
                alias: alias.to_string(),
            })
    }

    fn deactivate(&mut self, alias: &str) {
        let Some(certificate) = self.active(alias).map(|o| o.certificate.clone()) else {
            debug!(token = self.reader.label(), alias, "Nothing to deactivate for alias");
            return;
        };
        debug!(token = self.reader.label(), alias, "Alias deactivated");
        self.suppressed.insert(certificate);
    }

    fn reload(&mut self) -> KeystoreResult<()> {
        let objects = self.reader.read_objects().map_err(|e| KeystoreError::Reload {
            source_name: self.reader.label().to_string(),
            reason: e.to_string(),
        })?;
        self.objects = objects;
        Ok(())
    }

    fn is_preferred(&self) -> bool {
        self.preferred
    }
}
