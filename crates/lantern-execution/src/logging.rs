//! Global subscriber setup.

use crate::tracing_layer::GenerationEventLayer;
use anyhow::{Context, Result};
use lantern_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Builds the filter: `RUST_LOG` wins over the configured directive.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(&config.filter).unwrap_or_else(|e| {
            eprintln!(
                "Invalid log filter {:?} ({}), falling back to \"info\"",
                config.filter, e
            );
            EnvFilter::new("info")
        })
    })
}

/// Installs the global subscriber: formatted output plus, optionally, the
/// generation event forwarder.
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig, events: Option<GenerationEventLayer>) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(events)
        .try_init()
        .context("Failed to install tracing subscriber")?;
    tracing::debug!("Tracing initialized with filter {:?}", config.filter);
    Ok(())
}
