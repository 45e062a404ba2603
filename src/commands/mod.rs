//! CLI command implementations for scribe.
//!
//! - [`serve`] - HTTP API with the background sweeper
//! - [`sweep`] - One maintenance pass against the configured store
//! - [`config_cmd`] - Validate and print the effective configuration

pub mod config_cmd;
pub mod serve;
pub mod sweep;

use crate::config::{Config, LoggingConfig};
use crate::daemon::services::transcription::TranscriptionStore;
use anyhow::Result;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_logging(logging: &LoggingConfig) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

/// Validate `config`, log its warnings and open the store it describes.
pub(crate) fn open_store(config: &Config) -> Result<TranscriptionStore> {
    let validation = config.validate()?;
    for warning in &validation.warnings {
        tracing::warn!("{warning}");
    }

    let kv = config.open_kv()?;
    Ok(TranscriptionStore::new(kv, config.store_config()))
}
