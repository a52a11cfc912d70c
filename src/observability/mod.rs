// src/observability/mod.rs
//! Tracing setup
//!
//! Wrappers emit `tracing` events and `metrics` counters on their own; this
//! module only installs a subscriber for applications that don't bring one.

use crate::utils::config::{LogFormat, LoggingSettings};
use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static TRACING: OnceCell<()> = OnceCell::new();

/// Install the global fmt subscriber. Safe to call more than once; only the
/// first call has any effect.
pub fn init_tracing(settings: &LoggingSettings) -> Result<()> {
    TRACING
        .get_or_try_init(|| -> Result<()> {
            let filter = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&settings.filter))?;

            let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

            match settings.format {
                LogFormat::Json => builder.json().try_init(),
                LogFormat::Pretty => builder.try_init(),
            }
            .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
        })
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let settings = LoggingSettings::default();
        assert!(init_tracing(&settings).is_ok());
        assert!(init_tracing(&settings).is_ok());
    }
}
