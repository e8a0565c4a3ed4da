//! Shared helpers for integration tests

#![allow(dead_code)]

pub mod api_server;

use socialbot::{ApiConfig, Config};
use std::net::SocketAddr;
use std::time::Duration;

/// Config for a seeded run of `users` users
pub fn run_config(users: usize, posts: usize, likes: usize) -> Config {
    let mut config = Config::default();
    config.run.number_of_users = users;
    config.run.max_posts_per_user = posts;
    config.run.max_likes_per_user = likes;
    config.run.seed = Some(2024);
    config
}

/// API settings pointing at a local test server
pub fn api_config(addr: SocketAddr) -> ApiConfig {
    ApiConfig {
        base_url: format!("http://{}/api", addr),
        request_timeout: Duration::from_secs(5),
        ..ApiConfig::default()
    }
}
