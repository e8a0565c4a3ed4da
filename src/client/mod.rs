//! Social-posting API collaborator
//!
//! [`ApiClient`] is the seam between simulated sessions and the API they
//! drive. [`RestClient`] talks HTTP; [`MockApiClient`] keeps users, tokens
//! and posts in memory and records every call.

pub mod mock;
pub mod rest;
pub mod types;

use crate::error::Result;
use async_trait::async_trait;

pub use mock::{ApiCall, MockApiClient};
pub use rest::RestClient;
pub use types::{AccessToken, CreatedPost, Credentials, NewPost, PostId, TokenPair};

/// Operations a simulated user performs against the API.
///
/// Rejections of account operations surface as [`Error::Auth`], rejections of
/// post operations as [`Error::Api`]. Implementations never retry.
///
/// [`Error::Auth`]: crate::error::Error::Auth
/// [`Error::Api`]: crate::error::Error::Api
#[async_trait]
pub trait ApiClient: Send + Sync + 'static {
    async fn signup(&self, creds: &Credentials) -> Result<()>;

    async fn login(&self, creds: &Credentials) -> Result<TokenPair>;

    /// Invalidate `refresh_token`; authenticated with `access_token`
    async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<()>;

    async fn refresh_token(&self, refresh_token: &str) -> Result<AccessToken>;

    async fn create_post(&self, access_token: &str, post: &NewPost) -> Result<CreatedPost>;

    async fn like_post(&self, access_token: &str, post_id: PostId) -> Result<()>;
}
