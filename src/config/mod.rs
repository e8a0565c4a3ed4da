//! Run configuration for socialbot
//!
//! Configuration is assembled once, before any session starts:
//! - TOML file (`socialbot.toml` by default), every section optional
//! - `SOCIALBOT_*` environment variable overrides
//! - CLI flag overrides (applied by the binary)
//! - validation
//!
//! The resulting [`Config`] is immutable for the duration of a run.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "socialbot.toml";

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "http://0.0.0.0:8000/api";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub run: RunConfig,
    pub api: ApiConfig,
    pub barrier: BarrierConfig,
    pub logging: LoggingConfig,
}

/// Shape of the simulated workload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of concurrent simulated users
    pub number_of_users: usize,
    /// Posts created by each user before the barrier
    pub max_posts_per_user: usize,
    /// Likes issued by each user after the barrier
    pub max_likes_per_user: usize,
    /// Base seed for per-session fake data; entropy when unset
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            number_of_users: 1,
            max_posts_per_user: 1,
            max_likes_per_user: 1,
            seed: None,
        }
    }
}

impl RunConfig {
    /// Number of post ids the registry holds once every creation succeeded
    pub fn expected_posts(&self) -> usize {
        self.number_of_users * self.max_posts_per_user
    }
}

/// HTTP collaborator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("socialbot/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Phase barrier settings
///
/// Without a timeout a session that aborts before the barrier leaves every
/// peer waiting forever.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierConfig {
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error)
    pub level: String,
    /// Colored terminal output
    pub ansi: bool,
    /// Let `RUST_LOG` replace `level` when it is set
    pub env_override: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
            env_override: true,
        }
    }
}

impl Config {
    /// Load configuration from `path`, then apply environment overrides.
    ///
    /// With `path == None` the default file is read when present and defaults
    /// are used otherwise. An explicit path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, Path::new(DEFAULT_CONFIG_FILE), |key| env::var(key).ok())
    }

    /// [`Config::load`] with an explicit fallback file and variable source
    pub fn load_with<F>(path: Option<&Path>, default_file: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None if default_file.exists() => Self::load_from_file(default_file)?,
            None => Self::default(),
        };

        config.override_from(lookup)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply overrides from an arbitrary variable source
    pub fn override_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("SOCIALBOT_NUMBER_OF_USERS") {
            self.run.number_of_users = parse_var("SOCIALBOT_NUMBER_OF_USERS", &val)?;
        }

        if let Some(val) = lookup("SOCIALBOT_MAX_POSTS_PER_USER") {
            self.run.max_posts_per_user = parse_var("SOCIALBOT_MAX_POSTS_PER_USER", &val)?;
        }

        if let Some(val) = lookup("SOCIALBOT_MAX_LIKES_PER_USER") {
            self.run.max_likes_per_user = parse_var("SOCIALBOT_MAX_LIKES_PER_USER", &val)?;
        }

        if let Some(val) = lookup("SOCIALBOT_BASE_URL") {
            self.api.base_url = val;
        }

        if let Some(val) = lookup("SOCIALBOT_LOG_LEVEL") {
            self.logging.level = val;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.run.number_of_users == 0 {
            return Err(Error::Config("number_of_users must be >= 1".to_string()));
        }

        let url = url::Url::parse(&self.api.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Unsupported base URL scheme: {}",
                url.scheme()
            )));
        }

        if self.api.request_timeout.is_zero() {
            return Err(Error::Config("request_timeout must be > 0".to_string()));
        }

        if let Some(timeout) = self.barrier.timeout {
            if timeout.is_zero() {
                return Err(Error::Config("barrier timeout must be > 0".to_string()));
            }
        }

        if self.run.max_posts_per_user == 0 && self.run.max_likes_per_user > 0 {
            tracing::warn!(
                "max_posts_per_user is 0: the post pool will be empty and no likes will be issued"
            );
        }

        Ok(())
    }
}

fn parse_var(key: &str, val: &str) -> Result<usize> {
    val.trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {:?}", key, val)))
}
