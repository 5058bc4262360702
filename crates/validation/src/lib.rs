//! Certificate trust decisions.
//!
//! A validator classifies a certificate into a [`TrustOutcome`]. Callers act on
//! the outcome through [`TrustOutcome::enforce`] (or [`require_trusted`]), which
//! fails closed: every outcome other than `Valid` is an error.

pub mod error;
pub mod outcome;
pub mod validator;

pub use error::{TrustError, TrustResult};
pub use outcome::{TrustOutcome, TrustReport};
pub use validator::{require_trusted, CertificateValidator, LocalValidator};
