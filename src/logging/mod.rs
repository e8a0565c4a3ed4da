//! Logging initialisation
//!
//! Installs a `tracing-subscriber` fmt layer. Unless `env_override` is off,
//! `RUST_LOG` takes precedence over the configured level so individual modules
//! can be tuned without editing the config file.

use crate::config::LoggingConfig;
use crate::error::{Error, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter for a configured level
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if config.env_override {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| Error::Config(format!("Invalid log level {:?}: {}", config.level, e)))
}

/// Install the global subscriber
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_ansi(config.ansi))
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to install log subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_rejected() {
        let config = LoggingConfig {
            level: "socialbot=loud".to_string(),
            ansi: false,
            env_override: false,
        };
        assert!(matches!(env_filter(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_module_directives() {
        let config = LoggingConfig {
            level: "warn,socialbot::barrier=debug".to_string(),
            ansi: false,
            env_override: false,
        };
        assert!(env_filter(&config).is_ok());
    }
}
