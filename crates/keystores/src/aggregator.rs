//! Several credential sources presented as one logical store.
//!
//! Sources are consulted in the order they were added. Lookups stop at the
//! first source whose active aliases contain the requested alias.

use tracing::{debug, error, info, warn};

use crate::certificate::Certificate;
use crate::dedup::plan_deduplication;
use crate::error::{KeystoreError, KeystoreResult};
use crate::fingerprint::FingerprintAlgorithm;
use crate::key::PrivateKeyEntry;
use crate::software::SoftwareStore;
use crate::source::{CredentialSource, SourceKind};
use signcore_core::KeystoreConfig;

/// Ordered aggregate of credential sources with duplicate suppression.
#[derive(Debug)]
pub struct CredentialAggregator {
    sources: Vec<Box<dyn CredentialSource>>,
    fingerprint_algorithm: Option<FingerprintAlgorithm>,
    kind: SourceKind,
}

impl CredentialAggregator {
    /// Create an empty aggregate.
    ///
    /// With `fingerprint_algorithm = None` preferred sources are added without
    /// duplicate suppression.
    pub fn new(fingerprint_algorithm: Option<FingerprintAlgorithm>) -> Self {
        Self {
            sources: Vec::new(),
            fingerprint_algorithm,
            kind: SourceKind::Aggregate,
        }
    }

    /// Create an aggregate around a mandatory primary source.
    ///
    /// The aggregate reports the primary source's kind.
    pub fn with_primary(
        primary: impl Into<Option<Box<dyn CredentialSource>>>,
        fingerprint_algorithm: Option<FingerprintAlgorithm>,
    ) -> KeystoreResult<Self> {
        let primary = primary.into().ok_or(KeystoreError::MissingPrimarySource)?;
        let mut aggregator = Self::new(fingerprint_algorithm);
        aggregator.kind = primary.kind();
        aggregator.push(primary);
        Ok(aggregator)
    }

    /// Build the aggregate described by the `[keystores]` configuration.
    ///
    /// The first configured software store is the primary source. An unknown
    /// fingerprint algorithm disables duplicate suppression instead of failing.
    pub fn from_config(config: &KeystoreConfig) -> KeystoreResult<Self> {
        let fingerprint_algorithm = match config.fingerprint_algorithm.parse() {
            Ok(algorithm) => Some(algorithm),
            Err(e) => {
                error!(
                    error = %e,
                    "Fingerprint digest unavailable, duplicate certificates may be listed"
                );
                None
            }
        };

        let mut stores = config.software.iter();
        let primary = stores
            .next()
            .map(|store| SoftwareStore::open(&store.path, store.preferred))
            .transpose()?
            .map(|store| Box::new(store) as Box<dyn CredentialSource>);
        let mut aggregator = Self::with_primary(primary, fingerprint_algorithm)?;

        for store in stores {
            let source = SoftwareStore::open(&store.path, store.preferred)?;
            aggregator.add(Box::new(source) as Box<dyn CredentialSource>, store.preferred);
        }
        Ok(aggregator)
    }

    /// Append a source. `None` is ignored.
    ///
    /// When `preferred` is set, aliases in sources already present whose
    /// certificate matches one of the new source's certificates are deactivated.
    /// Sources added afterwards are not checked against this one.
    pub fn add(&mut self, source: impl Into<Option<Box<dyn CredentialSource>>>, preferred: bool) {
        let Some(source) = source.into() else {
            return;
        };

        if preferred {
            self.suppress_duplicates_of(source.as_ref());
        }

        debug!(
            source = source.name(),
            kind = %source.kind(),
            preferred,
            position = self.sources.len(),
            "Credential source added"
        );
        self.sources.push(source);
    }

    /// Append a source using its own preference flag.
    pub fn push(&mut self, source: Box<dyn CredentialSource>) {
        let preferred = source.is_preferred();
        self.add(source, preferred);
    }

    fn suppress_duplicates_of(&mut self, preferred: &dyn CredentialSource) {
        let Some(algorithm) = self.fingerprint_algorithm else {
            error!(
                source = preferred.name(),
                "No fingerprint digest available, skipping duplicate suppression"
            );
            return;
        };

        let plan = plan_deduplication(&self.sources, preferred, algorithm);
        for deactivation in plan {
            let source = &mut self.sources[deactivation.source_index];
            info!(
                source = source.name(),
                alias = %deactivation.alias,
                fingerprint = %deactivation.fingerprint,
                preferred_source = preferred.name(),
                "Duplicate certificate deactivated"
            );
            source.deactivate(&deactivation.alias);
        }
    }

    /// Active aliases of every source, in source order. Duplicates across
    /// sources are kept unless suppressed.
    pub fn aliases(&self) -> Vec<String> {
        self.sources.iter().flat_map(|s| s.aliases()).collect()
    }

    pub fn certificate(&self, alias: &str) -> Option<Certificate> {
        match self.locate(alias) {
            Some(source) => source.certificate(alias),
            None => {
                warn!(alias, "No credential source contains a certificate with this alias");
                None
            }
        }
    }

    pub fn certificate_chain(&self, alias: &str) -> Option<Vec<Certificate>> {
        match self.locate(alias) {
            Some(source) => source.certificate_chain(alias),
            None => {
                warn!(alias, "No credential source contains a certificate chain with this alias");
                None
            }
        }
    }

    /// Private key entry for `alias`. An alias unknown to every source yields
    /// `Ok(None)`; store failures are propagated.
    pub fn key_entry(&self, alias: &str) -> KeystoreResult<Option<PrivateKeyEntry>> {
        match self.locate(alias) {
            Some(source) => source.key_entry(alias),
            None => {
                warn!(alias, "No credential source contains a key with this alias");
                Ok(None)
            }
        }
    }

    /// Whether `alias` refers to a private key.
    ///
    /// Unlike the other lookups, an alias no source contains is an error: the
    /// caller is expected to have listed the alias first.
    pub fn is_key_entry(&self, alias: &str) -> KeystoreResult<bool> {
        self.locate(alias)
            .ok_or_else(|| KeystoreError::AliasNotPresent {
                alias: alias.to_string(),
            })?
            .is_key_entry(alias)
    }

    /// Reload every source in order, stopping at the first failure.
    pub fn refresh(&mut self) -> KeystoreResult<()> {
        for source in self.sources.iter_mut() {
            if let Err(e) = source.reload() {
                error!(source = source.name(), error = %e, "Credential source refresh failed");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Drop every source. Backing storage is untouched.
    pub fn remove_all(&mut self) {
        self.sources.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn fingerprint_algorithm(&self) -> Option<FingerprintAlgorithm> {
        self.fingerprint_algorithm
    }

    fn locate(&self, alias: &str) -> Option<&dyn CredentialSource> {
        self.sources
            .iter()
            .find(|s| s.contains_alias(alias))
            .map(|s| s.as_ref())
    }
}
