//! End-to-end tests across the signcore crates
//!
//! This test suite validates:
//! - Credential aggregation over software stores and a secure-messaging token
//! - Trust gating of certificates before they are used for signing
//! - Session abort on tampered card responses

pub mod test_utils;

#[cfg(test)]
mod signing_workflow_tests;

#[cfg(test)]
mod secure_token_tests;
