//! Wire types exchanged with the social-posting API

use serde::{Deserialize, Serialize};

/// Post identifier assigned by the API
pub type PostId = u64;

/// Username and password of one simulated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Content of a post to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    /// Password confirmation
    pub password2: String,
}

impl From<&Credentials> for SignupRequest {
    fn from(creds: &Credentials) -> Self {
        Self {
            username: creds.username.clone(),
            password: creds.password.clone(),
            password2: creds.password.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl From<&Credentials> for LoginRequest {
    fn from(creds: &Credentials) -> Self {
        Self {
            username: creds.username.clone(),
            password: creds.password.clone(),
        }
    }
}

/// Body of logout and token refresh requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Login response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Token refresh response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    #[serde(default)]
    pub access: Option<String>,
}

/// Post creation response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPost {
    #[serde(default)]
    pub id: Option<PostId>,
}
