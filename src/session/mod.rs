//! Simulated-user sessions
//!
//! A [`UserSession`] drives one simulated user through the scripted
//! lifecycle against an [`ApiClient`]:
//!
//! signup -> login -> create posts -> phase barrier -> like sampled posts -> logout
//!
//! Any failure before logout aborts the session. A rejected logout is logged
//! and tolerated because every consequential call has already been made.

use crate::barrier::PhaseBarrier;
use crate::client::{ApiClient, Credentials, NewPost, PostId};
use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::fake::FakeData;
use crate::registry::PostRegistry;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// Identity and token state of one simulated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedUser {
    pub username: String,
    pub password: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub created_post_ids: HashSet<PostId>,
}

impl SimulatedUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            access_token: None,
            refresh_token: None,
            created_post_ids: HashSet::new(),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }

    /// Replace tokens with the non-empty values provided
    fn update_tokens(&mut self, access: Option<String>, refresh: Option<String>) {
        if let Some(access) = access.filter(|t| !t.is_empty()) {
            self.access_token = Some(access);
        }
        if let Some(refresh) = refresh.filter(|t| !t.is_empty()) {
            self.refresh_token = Some(refresh);
        }
    }
}

/// Shared state a session needs from its run
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub registry: Arc<PostRegistry>,
    pub barrier: Arc<PhaseBarrier>,
    pub run: RunConfig,
}

/// What a finished session did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub username: String,
    pub posts_created: usize,
    /// Size of the post pool this session sampled from
    pub pool_size: usize,
    pub likes_issued: usize,
    pub leader: bool,
    pub logged_out: bool,
}

/// One simulated user and the client it talks through
pub struct UserSession<C: ApiClient> {
    index: usize,
    user: SimulatedUser,
    client: Arc<C>,
    fake: FakeData,
}

impl<C: ApiClient> UserSession<C> {
    /// Session `index` with a generated username and password
    pub fn new(index: usize, client: Arc<C>, mut fake: FakeData) -> Self {
        let user = SimulatedUser::new(fake.username(), fake.password());
        Self::with_user(index, client, user, fake)
    }

    pub fn with_user(index: usize, client: Arc<C>, user: SimulatedUser, fake: FakeData) -> Self {
        Self {
            index,
            user,
            client,
            fake,
        }
    }

    pub fn user(&self) -> &SimulatedUser {
        &self.user
    }

    fn access_token(&self) -> Result<&str> {
        self.user.access_token.as_deref().ok_or_else(|| {
            Error::NotAuthenticated(format!("{} has no access token", self.user.username))
        })
    }

    fn refresh_token(&self) -> Result<&str> {
        self.user.refresh_token.as_deref().ok_or_else(|| {
            Error::NotAuthenticated(format!("{} has no refresh token", self.user.username))
        })
    }

    pub async fn signup(&mut self) -> Result<()> {
        self.client.signup(&self.user.credentials()).await?;
        debug!("Signed up");
        Ok(())
    }

    pub async fn login(&mut self) -> Result<()> {
        let tokens = self.client.login(&self.user.credentials()).await?;
        self.user.update_tokens(tokens.access, tokens.refresh);
        debug!("Logged in");
        Ok(())
    }

    /// Create a post and record its id locally and in `registry`.
    ///
    /// Returns the id, or `None` when the API answered without one.
    pub async fn create_post(
        &mut self,
        registry: &PostRegistry,
        title: String,
        text: String,
    ) -> Result<Option<PostId>> {
        let post = NewPost { title, text };
        let created = self.client.create_post(self.access_token()?, &post).await?;

        let Some(post_id) = created.id else {
            warn!(title = %post.title, "Post created without an id, nothing recorded");
            return Ok(None);
        };

        if self.user.created_post_ids.insert(post_id) {
            registry.record(post_id)?;
        }
        debug!(post_id, "Post created");
        Ok(Some(post_id))
    }

    pub async fn like_post(&mut self, post_id: PostId) -> Result<()> {
        self.client.like_post(self.access_token()?, post_id).await?;
        debug!(post_id, "Post liked");
        Ok(())
    }

    /// Renew the access token. Never called by the scripted lifecycle.
    pub async fn refresh_access_token(&mut self) -> Result<()> {
        let renewed = self.client.refresh_token(self.refresh_token()?).await?;
        self.user.update_tokens(renewed.access, None);
        debug!("Access token refreshed");
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<()> {
        let access = self.access_token()?;
        let refresh = self.refresh_token()?;
        self.client.logout(access, refresh).await?;
        debug!("Logged out");
        Ok(())
    }

    /// Run the full scripted lifecycle
    pub async fn run(self, ctx: SessionContext) -> Result<SessionOutcome> {
        let span = tracing::info_span!(
            "session",
            index = self.index,
            user = %self.user.username
        );
        self.run_inner(ctx).instrument(span).await
    }

    async fn run_inner(mut self, ctx: SessionContext) -> Result<SessionOutcome> {
        self.signup().await?;
        self.login().await?;

        for _ in 0..ctx.run.max_posts_per_user {
            let title = self.fake.catch_phrase();
            let text = self.fake.paragraph(3);
            self.create_post(&ctx.registry, title, text).await?;
        }

        let ticket = ctx.barrier.arrive_and_wait().await?;
        if ticket.is_leader() {
            info!(
                posts = ticket.snapshot().len(),
                "Last to arrive, released the like phase"
            );
        }

        let targets = ticket.sample(self.fake.rng(), ctx.run.max_likes_per_user);
        if targets.is_empty() && ctx.run.max_likes_per_user > 0 {
            warn!("Post pool is empty, skipping likes");
        }
        for post_id in &targets {
            self.like_post(*post_id).await?;
        }

        let logged_out = match self.logout().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Logout failed, ignoring");
                false
            }
        };

        Ok(SessionOutcome {
            username: self.user.username.clone(),
            posts_created: self.user.created_post_ids.len(),
            pool_size: ticket.snapshot().len(),
            likes_issued: targets.len(),
            leader: ticket.is_leader(),
            logged_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiCall, MockApiClient};
    use std::time::Duration;

    fn context(parties: usize, posts: usize, likes: usize) -> SessionContext {
        let registry = Arc::new(PostRegistry::new());
        SessionContext {
            barrier: Arc::new(PhaseBarrier::new(parties, Arc::clone(&registry), None)),
            registry,
            run: RunConfig {
                number_of_users: parties,
                max_posts_per_user: posts,
                max_likes_per_user: likes,
                seed: Some(11),
            },
        }
    }

    fn session(api: &Arc<MockApiClient>, name: &str) -> UserSession<MockApiClient> {
        UserSession::with_user(
            0,
            Arc::clone(api),
            SimulatedUser::new(name, "pw123456789"),
            FakeData::seeded(1),
        )
    }

    #[tokio::test]
    async fn test_tokens_stored_on_login() {
        let api = Arc::new(MockApiClient::new());
        let mut s = session(&api, "carol");
        s.signup().await.unwrap();
        s.login().await.unwrap();

        assert!(s.user().access_token.is_some());
        assert!(s.user().refresh_token.is_some());

        let before = s.user().access_token.clone();
        s.refresh_access_token().await.unwrap();
        assert_ne!(s.user().access_token, before);
    }

    #[tokio::test]
    async fn test_post_requires_login() {
        let api = Arc::new(MockApiClient::new());
        let registry = PostRegistry::new();
        let mut s = session(&api, "dave");
        s.signup().await.unwrap();

        let result = s
            .create_post(&registry, "t".to_string(), "x".to_string())
            .await;
        assert!(matches!(result, Err(Error::NotAuthenticated(_))));
        assert!(api.posts().is_empty());
    }

    #[tokio::test]
    async fn test_created_post_recorded_locally_and_in_registry() {
        let api = Arc::new(MockApiClient::new());
        let registry = PostRegistry::new();
        let mut s = session(&api, "erin");
        s.signup().await.unwrap();
        s.login().await.unwrap();

        let id = s
            .create_post(&registry, "Title".to_string(), "Body".to_string())
            .await
            .unwrap();
        assert_eq!(id, Some(1));
        assert!(s.user().created_post_ids.contains(&1));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_post_without_id_not_recorded() {
        let api = Arc::new(MockApiClient::new().omit_post_ids());
        let registry = PostRegistry::new();
        let mut s = session(&api, "frank");
        s.signup().await.unwrap();
        s.login().await.unwrap();

        let id = s
            .create_post(&registry, "Title".to_string(), "Body".to_string())
            .await
            .unwrap();
        assert_eq!(id, None);
        assert!(s.user().created_post_ids.is_empty());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_signup_aborts() {
        let api = Arc::new(MockApiClient::new());
        session(&api, "gina").signup().await.unwrap();

        let result = session(&api, "gina").run(context(1, 1, 1)).await;
        assert!(matches!(result, Err(Error::Auth { operation: "signup", .. })));
        assert!(api.posts().is_empty());
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let api = Arc::new(MockApiClient::new());
        let ctx = context(1, 2, 3);
        let outcome = session(&api, "hank").run(ctx.clone()).await.unwrap();

        assert_eq!(outcome.posts_created, 2);
        assert_eq!(outcome.pool_size, 2);
        assert_eq!(outcome.likes_issued, 3);
        assert!(outcome.leader);
        assert!(outcome.logged_out);
        assert!(ctx.registry.is_sealed());
        assert_eq!(api.active_sessions(), 0);

        let kinds: Vec<&str> = api
            .calls()
            .iter()
            .map(|call| match call {
                ApiCall::Signup { .. } => "signup",
                ApiCall::Login { .. } => "login",
                ApiCall::CreatePost { .. } => "create",
                ApiCall::LikePost { .. } => "like",
                ApiCall::Logout { .. } => "logout",
                ApiCall::RefreshToken { .. } => "refresh",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["signup", "login", "create", "create", "like", "like", "like", "logout"]
        );
    }

    #[tokio::test]
    async fn test_logout_failure_tolerated() {
        let api = Arc::new(MockApiClient::new().fail_logout_for(0));
        let outcome = session(&api, "ivy").run(context(1, 1, 1)).await.unwrap();

        assert!(!outcome.logged_out);
        assert_eq!(outcome.likes_issued, 1);
        assert_eq!(
            api.rejected(),
            vec![ApiCall::Logout {
                username: "ivy".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_like_failure_aborts_before_logout() {
        let api = Arc::new(MockApiClient::new().fail_like_for(0));
        let result = session(&api, "jack").run(context(1, 1, 2)).await;

        assert!(matches!(result, Err(Error::Api { operation: "like post", .. })));
        assert!(!api
            .calls()
            .iter()
            .any(|call| matches!(call, ApiCall::Logout { .. })));
        assert_eq!(api.active_sessions(), 1);
    }

    #[tokio::test]
    async fn test_empty_pool_skips_likes() {
        let api = Arc::new(MockApiClient::new());
        let outcome = session(&api, "kate").run(context(1, 0, 4)).await.unwrap();

        assert_eq!(outcome.posts_created, 0);
        assert_eq!(outcome.likes_issued, 0);
        assert!(outcome.logged_out);
        assert!(api.likes().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_never_reaches_barrier() {
        let api = Arc::new(MockApiClient::new().fail_create_post_for(0));
        let ctx = context(2, 1, 1);
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            session(&api, "liam").run(ctx.clone()),
        )
        .await
        .unwrap();

        assert!(matches!(result, Err(Error::Api { operation: "create post", .. })));
        assert_eq!(ctx.barrier.arrived(), 0);
    }
}
