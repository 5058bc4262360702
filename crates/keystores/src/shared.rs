//! Thread-safe handle to a credential aggregate.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::aggregator::CredentialAggregator;
use crate::certificate::Certificate;
use crate::error::{KeystoreError, KeystoreResult};
use crate::key::PrivateKeyEntry;
use crate::source::CredentialSource;

/// Cloneable handle sharing one [`CredentialAggregator`] between threads.
///
/// Lookups run concurrently under the read lock; `add`, `push`, `refresh` and
/// `remove_all` are serialized under the write lock.
#[derive(Debug, Clone)]
pub struct SharedAggregator {
    inner: Arc<RwLock<CredentialAggregator>>,
}

impl SharedAggregator {
    pub fn new(aggregator: CredentialAggregator) -> Self {
        Self {
            inner: Arc::new(RwLock::new(aggregator)),
        }
    }

    fn read(&self) -> KeystoreResult<RwLockReadGuard<'_, CredentialAggregator>> {
        self.inner
            .read()
            .map_err(|e| KeystoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> KeystoreResult<RwLockWriteGuard<'_, CredentialAggregator>> {
        self.inner
            .write()
            .map_err(|e| KeystoreError::LockPoisoned(e.to_string()))
    }

    pub fn add(
        &self,
        source: impl Into<Option<Box<dyn CredentialSource>>>,
        preferred: bool,
    ) -> KeystoreResult<()> {
        self.write()?.add(source, preferred);
        Ok(())
    }

    pub fn push(&self, source: Box<dyn CredentialSource>) -> KeystoreResult<()> {
        self.write()?.push(source);
        Ok(())
    }

    pub fn aliases(&self) -> KeystoreResult<Vec<String>> {
        Ok(self.read()?.aliases())
    }

    pub fn certificate(&self, alias: &str) -> KeystoreResult<Option<Certificate>> {
        Ok(self.read()?.certificate(alias))
    }

    pub fn certificate_chain(&self, alias: &str) -> KeystoreResult<Option<Vec<Certificate>>> {
        Ok(self.read()?.certificate_chain(alias))
    }

    pub fn key_entry(&self, alias: &str) -> KeystoreResult<Option<PrivateKeyEntry>> {
        self.read()?.key_entry(alias)
    }

    pub fn is_key_entry(&self, alias: &str) -> KeystoreResult<bool> {
        self.read()?.is_key_entry(alias)
    }

    pub fn refresh(&self) -> KeystoreResult<()> {
        self.write()?.refresh()
    }

    pub fn remove_all(&self) -> KeystoreResult<()> {
        self.write()?.remove_all();
        Ok(())
    }

    pub fn is_empty(&self) -> KeystoreResult<bool> {
        Ok(self.read()?.is_empty())
    }
}

impl From<CredentialAggregator> for SharedAggregator {
    fn from(aggregator: CredentialAggregator) -> Self {
        Self::new(aggregator)
    }
}
