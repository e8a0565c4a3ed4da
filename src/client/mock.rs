//! In-memory API collaborator
//!
//! Behaves like the real API closely enough to drive full runs without a
//! server: duplicate usernames are rejected, tokens are checked, post ids are
//! assigned sequentially from 1. Every call is appended to an ordered log.
//!
//! Faults and delays are keyed by signup ordinal (0 for the first user to sign
//! up, 1 for the second, ...) because simulated usernames are random.

use super::types::*;
use super::ApiClient;
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// One call received by the mock, in arrival order
///
/// `username` is empty when the call carried an unrecognised token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Signup { username: String },
    Login { username: String },
    Logout { username: String },
    RefreshToken { username: String },
    /// `post_id` is `None` when the creation was rejected
    CreatePost { username: String, post_id: Option<PostId> },
    LikePost { username: String, post_id: PostId },
}

#[derive(Debug, Default, Clone)]
struct Faults {
    fail_create: HashSet<usize>,
    fail_like: HashSet<usize>,
    fail_logout: HashSet<usize>,
    create_delay: HashMap<usize, Duration>,
    omit_post_ids: bool,
}

#[derive(Debug)]
struct Account {
    password: String,
    ordinal: usize,
}

#[derive(Debug, Default)]
struct MockState {
    accounts: HashMap<String, Account>,
    access_tokens: HashMap<String, String>,
    refresh_tokens: HashMap<String, String>,
    posts: Vec<PostId>,
    likes: Vec<(String, PostId)>,
    next_post_id: PostId,
    next_token: u64,
    calls: Vec<ApiCall>,
    rejected: Vec<ApiCall>,
}

impl MockState {
    fn issue_token(&mut self, kind: &str) -> String {
        self.next_token += 1;
        format!("{}-{}", kind, self.next_token)
    }

    fn owner_of_access(&self, access_token: &str) -> Option<(String, usize)> {
        let username = self.access_tokens.get(access_token)?;
        let ordinal = self.accounts.get(username)?.ordinal;
        Some((username.clone(), ordinal))
    }

    fn reject(&mut self, call: ApiCall) {
        self.calls.push(call.clone());
        self.rejected.push(call);
    }
}

/// In-memory [`ApiClient`]
#[derive(Debug, Default)]
pub struct MockApiClient {
    state: Mutex<MockState>,
    faults: Faults,
}

impl MockApiClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every post creation by the user with this signup ordinal
    pub fn fail_create_post_for(mut self, ordinal: usize) -> Self {
        self.faults.fail_create.insert(ordinal);
        self
    }

    /// Reject every like by the user with this signup ordinal
    pub fn fail_like_for(mut self, ordinal: usize) -> Self {
        self.faults.fail_like.insert(ordinal);
        self
    }

    /// Reject the logout of the user with this signup ordinal
    pub fn fail_logout_for(mut self, ordinal: usize) -> Self {
        self.faults.fail_logout.insert(ordinal);
        self
    }

    /// Delay every post creation by the user with this signup ordinal
    pub fn delay_create_post_for(mut self, ordinal: usize, delay: Duration) -> Self {
        self.faults.create_delay.insert(ordinal, delay);
        self
    }

    /// Answer post creations with a body that carries no id
    pub fn omit_post_ids(mut self) -> Self {
        self.faults.omit_post_ids = true;
        self
    }

    /// Every call received so far, in arrival order
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().calls.clone()
    }

    /// Calls that were answered with a non-success status
    pub fn rejected(&self) -> Vec<ApiCall> {
        self.state.lock().rejected.clone()
    }

    /// Ids of every post created, in creation order
    pub fn posts(&self) -> Vec<PostId> {
        self.state.lock().posts.clone()
    }

    /// Accepted likes as `(username, post_id)`
    pub fn likes(&self) -> Vec<(String, PostId)> {
        self.state.lock().likes.clone()
    }

    /// Number of registered accounts
    pub fn account_count(&self) -> usize {
        self.state.lock().accounts.len()
    }

    /// Number of refresh tokens still valid
    pub fn active_sessions(&self) -> usize {
        self.state.lock().refresh_tokens.len()
    }

    fn ordinal_of_access(&self, access_token: &str) -> Option<usize> {
        self.state
            .lock()
            .owner_of_access(access_token)
            .map(|(_, ordinal)| ordinal)
    }
}

fn unauthorized(operation: &'static str) -> Error {
    Error::Auth {
        operation,
        status: 401,
        message: "invalid credentials or token".to_string(),
    }
}

fn api_rejection(operation: &'static str, status: u16, message: &str) -> Error {
    Error::Api {
        operation,
        status,
        message: message.to_string(),
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn signup(&self, creds: &Credentials) -> Result<()> {
        let mut state = self.state.lock();
        let call = ApiCall::Signup {
            username: creds.username.clone(),
        };

        if state.accounts.contains_key(&creds.username) {
            state.reject(call);
            return Err(Error::Auth {
                operation: "signup",
                status: 400,
                message: "username already exists".to_string(),
            });
        }

        let ordinal = state.accounts.len();
        state.accounts.insert(
            creds.username.clone(),
            Account {
                password: creds.password.clone(),
                ordinal,
            },
        );
        state.calls.push(call);
        Ok(())
    }

    async fn login(&self, creds: &Credentials) -> Result<TokenPair> {
        let mut state = self.state.lock();
        let call = ApiCall::Login {
            username: creds.username.clone(),
        };

        let valid = state
            .accounts
            .get(&creds.username)
            .map_or(false, |account| account.password == creds.password);
        if !valid {
            state.reject(call);
            return Err(unauthorized("login"));
        }

        let access = state.issue_token("access");
        let refresh = state.issue_token("refresh");
        state
            .access_tokens
            .insert(access.clone(), creds.username.clone());
        state
            .refresh_tokens
            .insert(refresh.clone(), creds.username.clone());
        state.calls.push(call);

        Ok(TokenPair {
            access: Some(access),
            refresh: Some(refresh),
        })
    }

    async fn logout(&self, access_token: &str, refresh_token: &str) -> Result<()> {
        let mut state = self.state.lock();
        let Some((username, ordinal)) = state.owner_of_access(access_token) else {
            state.reject(ApiCall::Logout {
                username: String::new(),
            });
            return Err(unauthorized("logout"));
        };
        let call = ApiCall::Logout {
            username: username.clone(),
        };

        let owns_refresh = state.refresh_tokens.get(refresh_token) == Some(&username);
        if !owns_refresh || self.faults.fail_logout.contains(&ordinal) {
            state.reject(call);
            return Err(unauthorized("logout"));
        }

        state.refresh_tokens.remove(refresh_token);
        state.calls.push(call);
        Ok(())
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AccessToken> {
        let mut state = self.state.lock();
        let Some(username) = state.refresh_tokens.get(refresh_token).cloned() else {
            state.reject(ApiCall::RefreshToken {
                username: String::new(),
            });
            return Err(unauthorized("token refresh"));
        };

        let access = state.issue_token("access");
        state.access_tokens.insert(access.clone(), username.clone());
        state.calls.push(ApiCall::RefreshToken { username });

        Ok(AccessToken {
            access: Some(access),
        })
    }

    async fn create_post(&self, access_token: &str, post: &NewPost) -> Result<CreatedPost> {
        let Some(ordinal) = self.ordinal_of_access(access_token) else {
            self.state.lock().reject(ApiCall::CreatePost {
                username: String::new(),
                post_id: None,
            });
            return Err(api_rejection("create post", 401, "authentication required"));
        };

        if let Some(delay) = self.faults.create_delay.get(&ordinal) {
            tokio::time::sleep(*delay).await;
        }

        let mut state = self.state.lock();
        let (username, _) = state
            .owner_of_access(access_token)
            .ok_or_else(|| api_rejection("create post", 401, "authentication required"))?;

        if post.title.is_empty() || self.faults.fail_create.contains(&ordinal) {
            state.reject(ApiCall::CreatePost {
                username,
                post_id: None,
            });
            return Err(api_rejection("create post", 400, "post rejected"));
        }

        state.next_post_id += 1;
        let post_id = state.next_post_id;
        state.posts.push(post_id);
        state.calls.push(ApiCall::CreatePost {
            username,
            post_id: Some(post_id),
        });

        Ok(CreatedPost {
            id: (!self.faults.omit_post_ids).then_some(post_id),
        })
    }

    async fn like_post(&self, access_token: &str, post_id: PostId) -> Result<()> {
        let mut state = self.state.lock();
        let Some((username, ordinal)) = state.owner_of_access(access_token) else {
            state.reject(ApiCall::LikePost {
                username: String::new(),
                post_id,
            });
            return Err(api_rejection("like post", 401, "authentication required"));
        };
        let call = ApiCall::LikePost {
            username: username.clone(),
            post_id,
        };

        if !state.posts.contains(&post_id) {
            state.reject(call);
            return Err(api_rejection("like post", 404, "post not found"));
        }
        if self.faults.fail_like.contains(&ordinal) {
            state.reject(call);
            return Err(api_rejection("like post", 500, "like rejected"));
        }

        state.likes.push((username, post_id));
        state.calls.push(call);
        Ok(())
    }
}
