//! Minimal social-posting API served over HTTP with axum

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ServerState {
    pub accounts: HashMap<String, String>,
    pub access_tokens: HashMap<String, String>,
    pub refresh_tokens: HashMap<String, String>,
    pub posts: Vec<(u64, String)>,
    pub likes: Vec<(String, u64)>,
    pub logouts: Vec<String>,
    /// Answer post creation with a plain-text body instead of JSON
    pub plain_text_posts: bool,
    next_post_id: u64,
    next_token: u64,
}

impl ServerState {
    fn issue_token(&mut self, kind: &str) -> String {
        self.next_token += 1;
        format!("{}-{}", kind, self.next_token)
    }

    fn bearer_user(&self, headers: &HeaderMap) -> Option<String> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let token = value.strip_prefix("Bearer ")?;
        self.access_tokens.get(token).cloned()
    }
}

pub type SharedState = Arc<Mutex<ServerState>>;

#[derive(Deserialize)]
struct SignupBody {
    username: String,
    password: String,
    password2: String,
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh: String,
}

#[derive(Deserialize)]
struct PostBody {
    title: String,
    text: String,
}

/// Serve the API on an ephemeral local port
pub async fn spawn() -> (SocketAddr, SharedState) {
    let state: SharedState = Arc::default();
    let app = Router::new()
        .route("/api/users/signup/", post(signup))
        .route("/api/users/login/", post(login))
        .route("/api/users/logout/", post(logout))
        .route("/api/users/token/refresh", post(refresh))
        .route("/api/posts/", post(create_post))
        .route("/api/posts/:id/like/", post(like_post))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });

    (addr, state)
}

async fn signup(State(state): State<SharedState>, Json(body): Json<SignupBody>) -> StatusCode {
    let mut state = state.lock();
    if body.password != body.password2 || state.accounts.contains_key(&body.username) {
        return StatusCode::BAD_REQUEST;
    }
    state.accounts.insert(body.username, body.password);
    StatusCode::CREATED
}

async fn login(
    State(state): State<SharedState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<Value>, StatusCode> {
    let mut state = state.lock();
    if state.accounts.get(&body.username) != Some(&body.password) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let access = state.issue_token("access");
    let refresh = state.issue_token("refresh");
    state.access_tokens.insert(access.clone(), body.username.clone());
    state.refresh_tokens.insert(refresh.clone(), body.username);
    Ok(Json(json!({ "access": access, "refresh": refresh })))
}

async fn logout(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<RefreshBody>,
) -> StatusCode {
    let mut state = state.lock();
    let Some(username) = state.bearer_user(&headers) else {
        return StatusCode::UNAUTHORIZED;
    };
    if state.refresh_tokens.get(&body.refresh) != Some(&username) {
        return StatusCode::BAD_REQUEST;
    }
    state.refresh_tokens.remove(&body.refresh);
    state.logouts.push(username);
    StatusCode::RESET_CONTENT
}

async fn refresh(
    State(state): State<SharedState>,
    Json(body): Json<RefreshBody>,
) -> Result<Json<Value>, StatusCode> {
    let mut state = state.lock();
    let owner = state
        .refresh_tokens
        .get(&body.refresh)
        .cloned()
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let access = state.issue_token("access");
    state.access_tokens.insert(access.clone(), owner);
    Ok(Json(json!({ "access": access })))
}

async fn create_post(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<PostBody>,
) -> Result<Response, StatusCode> {
    let mut state = state.lock();
    let username = state.bearer_user(&headers).ok_or(StatusCode::UNAUTHORIZED)?;
    if body.title.is_empty() || body.text.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    state.next_post_id += 1;
    let id = state.next_post_id;
    state.posts.push((id, username));
    if state.plain_text_posts {
        return Ok((StatusCode::CREATED, format!("created post {}", id)).into_response());
    }
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "title": body.title, "text": body.text })),
    )
        .into_response())
}

async fn like_post(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> StatusCode {
    let mut state = state.lock();
    let Some(username) = state.bearer_user(&headers) else {
        return StatusCode::UNAUTHORIZED;
    };
    if !state.posts.iter().any(|(post_id, _)| *post_id == id) {
        return StatusCode::NOT_FOUND;
    }
    state.likes.push((username, id));
    StatusCode::OK
}
