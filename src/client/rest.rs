//! HTTP implementation of [`ApiClient`]

use super::types::*;
use super::ApiClient;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Which error family a rejected request belongs to
#[derive(Debug, Clone, Copy)]
enum Family {
    Auth,
    Api,
}

/// REST client for the social-posting API
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    /// Create a new REST client
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    fn bearer(request: RequestBuilder, access_token: &str) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("Bearer {}", access_token))
    }

    /// Send a request and turn a non-success status into a typed rejection
    async fn send(
        &self,
        operation: &'static str,
        family: Family,
        request: RequestBuilder,
    ) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(operation, status = status.as_u16(), "API response");

        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        let status = status.as_u16();
        Err(match family {
            Family::Auth => Error::Auth {
                operation,
                status,
                message,
            },
            Family::Api => Error::Api {
                operation,
                status,
                message,
            },
        })
    }

    async fn send_json<T>(
        &self,
        operation: &'static str,
        family: Family,
        request: RequestBuilder,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(operation, family, request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            Error::Serialization(format!("Failed to decode {} response: {}", operation, e))
        })
    }
}

#[async_trait]
impl ApiClient for RestClient {
    async fn signup(&self, creds: &Credentials) -> Result<()> {
        let request = self.post("users/signup/").json(&SignupRequest::from(creds));
        self.send("signup", Family::Auth, request).await?;
        Ok(())
    }

    async fn login(&self, creds: &Credentials) -> Result<TokenPair> {
        let request = self.post("users/login/").json(&LoginRequest::from(creds));
        self.send_json("login", Family::Auth, request).await
    }

    async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        let request = Self::bearer(self.post("users/logout/"), access_token).json(&RefreshRequest {
            refresh: refresh_token.to_string(),
        });
        self.send("logout", Family::Auth, request).await?;
        Ok(())
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AccessToken> {
        let request = self.post("users/token/refresh").json(&RefreshRequest {
            refresh: refresh_token.to_string(),
        });
        self.send_json("token refresh", Family::Auth, request).await
    }

    async fn create_post(&self, access_token: &str, post: &NewPost) -> Result<CreatedPost> {
        let request = Self::bearer(self.post("posts/"), access_token).json(post);
        self.send_json("create post", Family::Api, request).await
    }

    async fn like_post(&self, access_token: &str, post_id: PostId) -> Result<()> {
        let request = Self::bearer(self.post(&format!("posts/{}/like/", post_id)), access_token);
        self.send("like post", Family::Api, request).await?;
        Ok(())
    }
}
