//! The capability every backing store of certificates and keys provides.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::certificate::Certificate;
use crate::error::KeystoreResult;
use crate::key::PrivateKeyEntry;

/// Broad family of a credential source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// File-backed software container
    Software,
    /// Hardware token or smart card
    Token,
    /// Several sources behind one aggregate
    Aggregate,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Software => "software",
            SourceKind::Token => "token",
            SourceKind::Aggregate => "aggregate",
        };
        f.write_str(name)
    }
}

/// One backing store of certificates and private keys.
///
/// Aliases are unique only within a single source. Deactivating an alias hides
/// it from `aliases()` without touching the backing storage.
pub trait CredentialSource: Send + Sync {
    /// Human-readable identifier used in logs and errors.
    fn name(&self) -> &str;

    fn kind(&self) -> SourceKind;

    /// Active aliases, in the store's own order.
    fn aliases(&self) -> Vec<String>;

    fn certificate(&self, alias: &str) -> Option<Certificate>;

    /// Certificate chain, leaf first.
    fn certificate_chain(&self, alias: &str) -> Option<Vec<Certificate>>;

    fn key_entry(&self, alias: &str) -> KeystoreResult<Option<PrivateKeyEntry>>;

    fn is_key_entry(&self, alias: &str) -> KeystoreResult<bool>;

    fn deactivate(&mut self, alias: &str);

    /// Re-read the backing storage.
    fn reload(&mut self) -> KeystoreResult<()>;

    /// Whether certificates from this source win over duplicates elsewhere.
    fn is_preferred(&self) -> bool;

    fn contains_alias(&self, alias: &str) -> bool {
        self.aliases().iter().any(|a| a == alias)
    }
}

impl fmt::Debug for dyn CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSource")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("preferred", &self.is_preferred())
            .finish()
    }
}
