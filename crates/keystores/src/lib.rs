//! Credential aggregation for signing clients.
//!
//! This crate presents several certificate and private-key stores (software
//! files, hardware tokens) as one logical store, with a defined lookup order
//! and suppression of certificates duplicated across stores.
//!
//! # Core Concepts
//!
//! - **Credential Source**: one backing store addressed by alias
//! - **Aggregator**: ordered sources, first match wins on lookup
//! - **Preferred Source**: a source whose certificates hide identical ones
//!   (same fingerprint) in sources added before it
//! - **Deactivation**: logical deletion of an alias, the backing storage is
//!   never modified
//!
//! # Lookup Semantics
//!
//! A missing alias is not an error for `certificate`, `certificate_chain` and
//! `key_entry`; they return `None` and log a warning. `is_key_entry` on an alias
//! no source exposes is a caller error.

pub mod aggregator;
pub mod certificate;
pub mod dedup;
pub mod error;
pub mod fingerprint;
pub mod key;
pub mod shared;
pub mod software;
pub mod source;
pub mod token;

pub use aggregator::CredentialAggregator;
pub use certificate::Certificate;
pub use dedup::{plan_deduplication, Deactivation};
pub use error::{KeystoreError, KeystoreResult};
pub use fingerprint::{Fingerprint, FingerprintAlgorithm};
pub use key::{KeyAlgorithm, KeyHandle, PrivateKeyEntry, SoftwareKey};
pub use shared::SharedAggregator;
pub use software::{SoftwareStore, StoredEntry, StoredKey};
pub use source::{CredentialSource, SourceKind};
pub use token::{TokenObject, TokenReader, TokenStore};
