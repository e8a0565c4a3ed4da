//! Command-line interface definition
//!
//! Flags override values from the configuration file and environment.

use clap::Parser;
use socialbot::Config;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line interface definition for socialbot
#[derive(Parser, Debug)]
#[command(name = "socialbot")]
#[command(version, about = "Simulate concurrent users against a social-posting API")]
pub struct Cli {
    /// TOML configuration file (defaults to ./socialbot.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of simulated users
    #[arg(short, long)]
    pub users: Option<usize>,

    /// Posts created by each user
    #[arg(short, long)]
    pub posts: Option<usize>,

    /// Likes issued by each user
    #[arg(short, long)]
    pub likes: Option<usize>,

    /// API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Seed for reproducible fake data
    #[arg(long)]
    pub seed: Option<u64>,

    /// Give up waiting at the phase barrier after this many seconds
    #[arg(long)]
    pub barrier_timeout_secs: Option<u64>,

    /// Run against the in-memory API instead of HTTP
    #[arg(long)]
    pub dry_run: bool,

    /// Log at debug level, ignoring RUST_LOG
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply flag overrides on top of a loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(users) = self.users {
            config.run.number_of_users = users;
        }
        if let Some(posts) = self.posts {
            config.run.max_posts_per_user = posts;
        }
        if let Some(likes) = self.likes {
            config.run.max_likes_per_user = likes;
        }
        if let Some(base_url) = &self.base_url {
            config.api.base_url = base_url.clone();
        }
        if self.seed.is_some() {
            config.run.seed = self.seed;
        }
        if let Some(secs) = self.barrier_timeout_secs {
            config.barrier.timeout = Some(Duration::from_secs(secs));
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
            config.logging.env_override = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "socialbot",
            "--users",
            "3",
            "--likes",
            "0",
            "--barrier-timeout-secs",
            "10",
            "--verbose",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.run.number_of_users, 3);
        assert_eq!(config.run.max_posts_per_user, 1);
        assert_eq!(config.run.max_likes_per_user, 0);
        assert_eq!(config.barrier.timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.env_override);
        assert!(!cli.dry_run);
    }
}
