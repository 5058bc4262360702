//! Structured logging infrastructure for signcore.
//!
//! This module provides centralized logging initialization with support
//! for structured JSON output and environment-based configuration.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{CoreError, Result};

/// Initialize the logging system with structured output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level.
///
/// # Example
/// ```no_run
/// use signcore_core::logging;
///
/// logging::init().expect("subscriber already installed");
/// tracing::info!("Application started");
/// ```
pub fn init() -> Result<()> {
    init_with(&LoggingConfig::default())
}

/// Initialize the logging system with JSON output for production environments.
///
/// This format is suitable for log aggregation systems and structured log analysis.
/// Log level can be configured via the `RUST_LOG` environment variable.
pub fn init_json() -> Result<()> {
    init_with(&LoggingConfig {
        json: true,
        ..LoggingConfig::default()
    })
}

/// Initialize logging from the `[logging]` configuration section.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed.
pub fn init_with(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
    };

    installed.map_err(|e| CoreError::Logging(e.to_string()))
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), config)
}

/// Directives from the environment win; unset or invalid ones fall back to the
/// configured level.
fn filter_from(env_directives: Option<&str>, config: &LoggingConfig) -> EnvFilter {
    env_directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(&config.level))
}
