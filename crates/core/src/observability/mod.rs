//! Tracing bootstrap for AskArxiv services
//!
//! Binaries call [`init_tracing`] once at startup; the subscriber honors
//! `RUST_LOG` when set and falls back to the configured level.

use crate::config::ObservabilityConfig;
use crate::errors::{AppError, Result};
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Fails with a configuration error when a subscriber is already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let result = if config.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };

    result.map_err(|e| AppError::Configuration {
        message: format!("failed to install tracing subscriber: {}", e),
    })?;

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        json = config.json_logging,
        "Tracing initialized"
    );

    Ok(())
}
