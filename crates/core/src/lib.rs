//! Core functionality shared by the signcore crates.
//!
//! This crate provides the error type, logging bootstrap and configuration
//! model used across the credential, validation and smart-card layers.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, KeystoreConfig, LoggingConfig, SoftwareStoreConfig, ValidationConfig};
pub use error::{CoreError as Error, Result};
