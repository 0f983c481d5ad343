//! In-process stand-in for the Storynest service.
//!
//! Implements the service's wire contract over real HTTP so the library
//! under test talks to it exactly as it would to production. State lives
//! behind a mutex and is reachable from tests for seeding and asserts.

#![allow(dead_code)] // Each test binary uses a subset of the harness

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand_distr::Alphanumeric;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use super::constants::*;

type SharedState = Arc<Mutex<ServiceState>>;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct StubStory {
    story_id: String,
    author: String,
    title: String,
    url: String,
    username: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug)]
struct StubUser {
    username: String,
    password: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    /// Story ids in favoriting order.
    favorites: Vec<String>,
}

#[derive(Default)]
struct ServiceState {
    users: HashMap<String, StubUser>,
    /// Feed order: newest first.
    stories: Vec<StubStory>,
    /// token -> username
    tokens: HashMap<String, String>,
    /// Counts every request except the readiness probe.
    request_count: u64,
}

impl ServiceState {
    fn authenticate(&self, token: Option<&str>) -> Option<String> {
        token.and_then(|token| self.tokens.get(token).cloned())
    }

    fn user_json(&self, username: &str, include_collections: bool) -> Value {
        let user = &self.users[username];
        let mut value = json!({
            "username": user.username,
            "name": user.name,
            "createdAt": user.created_at,
            "updatedAt": user.updated_at,
        });
        if include_collections {
            let favorites: Vec<&StubStory> = user
                .favorites
                .iter()
                .filter_map(|id| self.stories.iter().find(|story| &story.story_id == id))
                .collect();
            let own: Vec<&StubStory> = self
                .stories
                .iter()
                .filter(|story| story.username == user.username)
                .collect();
            value["favorites"] = serde_json::to_value(favorites).unwrap();
            value["stories"] = serde_json::to_value(own).unwrap();
        }
        value
    }

    fn insert_story(&mut self, username: &str, author: &str, title: &str, url: &str) -> StubStory {
        let now = Utc::now();
        let story = StubStory {
            story_id: uuid::Uuid::new_v4().to_string(),
            author: author.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            username: username.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.stories.insert(0, story.clone());
        story
    }

    fn register_token(&mut self, username: &str) -> String {
        let token = generate_token();
        self.tokens.insert(token.clone(), username.to_string());
        token
    }

    /// Drops a story and every reference to it across user favorites.
    fn purge_story(&mut self, story_id: &str) {
        self.stories.retain(|story| story.story_id != story_id);
        for user in self.users.values_mut() {
            user.favorites.retain(|id| id != story_id);
        }
    }
}

fn generate_token() -> String {
    let rng = rand::rng();
    rng.sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "error": {
                "status": status.as_u16(),
                "title": status.canonical_reason().unwrap_or("Error"),
                "message": message,
            }
        })),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

async fn ready() -> &'static str {
    "ok"
}

async fn list_stories(State(state): State<SharedState>) -> Response {
    let mut state = state.lock().unwrap();
    state.request_count += 1;
    Json(json!({ "stories": state.stories })).into_response()
}

async fn create_story(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.request_count += 1;

    let username = match state.authenticate(body["token"].as_str()) {
        Some(username) => username,
        None => return error_response(StatusCode::UNAUTHORIZED, "Invalid token"),
    };
    let (author, title, url) = match (
        body["story"]["author"].as_str(),
        body["story"]["title"].as_str(),
        body["story"]["url"].as_str(),
    ) {
        (Some(author), Some(title), Some(url)) => (author, title, url),
        _ => return error_response(StatusCode::BAD_REQUEST, "Missing story fields"),
    };
    let (author, title, url) = (author.to_string(), title.to_string(), url.to_string());

    let story = state.insert_story(&username, &author, &title, &url);
    (StatusCode::CREATED, Json(json!({ "story": story }))).into_response()
}

async fn update_story(
    State(state): State<SharedState>,
    Path(story_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.request_count += 1;

    let username = match state.authenticate(body["token"].as_str()) {
        Some(username) => username,
        None => return error_response(StatusCode::UNAUTHORIZED, "Invalid token"),
    };
    let Some(story) = state
        .stories
        .iter_mut()
        .find(|story| story.story_id == story_id)
    else {
        return error_response(StatusCode::NOT_FOUND, "Story not found");
    };
    if story.username != username {
        return error_response(StatusCode::FORBIDDEN, "Not your story");
    }

    if let Some(author) = body["story"]["author"].as_str() {
        story.author = author.to_string();
    }
    if let Some(title) = body["story"]["title"].as_str() {
        story.title = title.to_string();
    }
    if let Some(url) = body["story"]["url"].as_str() {
        story.url = url.to_string();
    }
    story.updated_at = Utc::now();

    Json(json!({ "story": story.clone() })).into_response()
}

async fn delete_story(
    State(state): State<SharedState>,
    Path(story_id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.request_count += 1;

    let username = match state.authenticate(body["token"].as_str()) {
        Some(username) => username,
        None => return error_response(StatusCode::UNAUTHORIZED, "Invalid token"),
    };
    let Some(story) = state
        .stories
        .iter()
        .find(|story| story.story_id == story_id)
        .cloned()
    else {
        return error_response(StatusCode::NOT_FOUND, "Story not found");
    };
    if story.username != username {
        return error_response(StatusCode::FORBIDDEN, "Not your story");
    }

    state.purge_story(&story_id);
    Json(json!({ "story": story })).into_response()
}

async fn signup(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.request_count += 1;

    let (username, password, name) = match (
        body["user"]["username"].as_str(),
        body["user"]["password"].as_str(),
        body["user"]["name"].as_str(),
    ) {
        (Some(username), Some(password), Some(name)) => (
            username.to_string(),
            password.to_string(),
            name.to_string(),
        ),
        _ => return error_response(StatusCode::BAD_REQUEST, "Missing user fields"),
    };
    if state.users.contains_key(&username) {
        return error_response(StatusCode::CONFLICT, "Username already taken");
    }

    let now = Utc::now();
    state.users.insert(
        username.clone(),
        StubUser {
            username: username.clone(),
            password,
            name,
            created_at: now,
            updated_at: now,
            favorites: Vec::new(),
        },
    );
    let token = state.register_token(&username);
    let user = state.user_json(&username, true);
    (
        StatusCode::CREATED,
        Json(json!({ "user": user, "token": token })),
    )
        .into_response()
}

async fn login(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock().unwrap();
    state.request_count += 1;

    let (username, password) = match (
        body["user"]["username"].as_str(),
        body["user"]["password"].as_str(),
    ) {
        (Some(username), Some(password)) => (username.to_string(), password.to_string()),
        _ => return error_response(StatusCode::BAD_REQUEST, "Missing user fields"),
    };
    let valid = state
        .users
        .get(&username)
        .map(|user| user.password == password)
        .unwrap_or(false);
    if !valid {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid username or password");
    }

    let token = state.register_token(&username);
    let user = state.user_json(&username, true);
    Json(json!({ "user": user, "token": token })).into_response()
}

/// Token check shared by the /users routes: the token must be valid and
/// must belong to the addressed user.
fn authorize_user(state: &ServiceState, token: Option<&str>, username: &str) -> Option<Response> {
    match state.authenticate(token) {
        None => Some(error_response(StatusCode::UNAUTHORIZED, "Invalid token")),
        Some(owner) if owner != username => {
            Some(error_response(StatusCode::FORBIDDEN, "Not your account"))
        }
        Some(_) => None,
    }
}

async fn get_user(
    State(state): State<SharedState>,
    Path(username): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.request_count += 1;

    let token = params.get("token").map(String::as_str);
    if let Some(response) = authorize_user(&state, token, &username) {
        return response;
    }
    Json(json!({ "user": state.user_json(&username, true) })).into_response()
}

async fn update_user(
    State(state): State<SharedState>,
    Path(username): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.request_count += 1;

    if let Some(response) = authorize_user(&state, body["token"].as_str(), &username) {
        return response;
    }
    let Some(name) = body["user"]["name"].as_str().map(str::to_string) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing name");
    };

    let user = state.users.get_mut(&username).unwrap();
    user.name = name;
    user.updated_at = Utc::now();

    // Profile responses carry no favorites/stories, like the real service
    Json(json!({ "user": state.user_json(&username, false) })).into_response()
}

async fn delete_user(
    State(state): State<SharedState>,
    Path(username): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.request_count += 1;

    if let Some(response) = authorize_user(&state, body["token"].as_str(), &username) {
        return response;
    }

    let own_ids: Vec<String> = state
        .stories
        .iter()
        .filter(|story| story.username == username)
        .map(|story| story.story_id.clone())
        .collect();
    for id in own_ids {
        state.purge_story(&id);
    }
    state.users.remove(&username);
    state.tokens.retain(|_, owner| owner != &username);

    Json(json!({ "message": "User deleted" })).into_response()
}

async fn add_favorite(
    State(state): State<SharedState>,
    Path((username, story_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.request_count += 1;

    if let Some(response) = authorize_user(&state, body["token"].as_str(), &username) {
        return response;
    }
    if !state.stories.iter().any(|story| story.story_id == story_id) {
        return error_response(StatusCode::NOT_FOUND, "Story not found");
    }

    let user = state.users.get_mut(&username).unwrap();
    // Favoriting twice keeps a single entry
    if !user.favorites.contains(&story_id) {
        user.favorites.push(story_id);
    }
    Json(json!({ "message": "Favorite Added!" })).into_response()
}

async fn remove_favorite(
    State(state): State<SharedState>,
    Path((username, story_id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock().unwrap();
    state.request_count += 1;

    if let Some(response) = authorize_user(&state, body["token"].as_str(), &username) {
        return response;
    }
    if !state.stories.iter().any(|story| story.story_id == story_id) {
        return error_response(StatusCode::NOT_FOUND, "Story not found");
    }

    let user = state.users.get_mut(&username).unwrap();
    user.favorites.retain(|id| id != &story_id);
    Json(json!({ "message": "Favorite Removed!" })).into_response()
}

// ============================================================================
// Test service lifecycle
// ============================================================================

/// Stub service instance bound to a random local port.
///
/// When dropped, the server gracefully shuts down.
pub struct TestService {
    /// Base URL for the library under test (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the service is listening on
    pub port: u16,

    state: SharedState,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestService {
    /// Spawns a new stub service on a random port and waits until it
    /// answers the readiness probe.
    ///
    /// # Panics
    ///
    /// Panics if port binding fails or the service doesn't become ready
    /// within the timeout.
    pub async fn spawn() -> Self {
        let state: SharedState = Arc::new(Mutex::new(ServiceState::default()));

        let app = Router::new()
            .route("/", get(ready))
            .route("/stories", get(list_stories).post(create_story))
            .route("/stories/{id}", patch(update_story).delete(delete_story))
            .route("/signup", post(signup))
            .route("/login", post(login))
            .route(
                "/users/{username}",
                get(get_user).patch(update_user).delete(delete_user),
            )
            .route(
                "/users/{username}/favorites/{story_id}",
                post(add_favorite).delete(remove_favorite),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let service = Self {
            base_url,
            port,
            state,
            _shutdown_tx: Some(shutdown_tx),
        };

        service.wait_for_ready().await;

        service
    }

    /// Waits for the service to become ready by polling the probe route
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Service did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }

    // ========================================================================
    // Seeding
    // ========================================================================

    /// Registers an account directly in service state.
    pub fn seed_user(&self, username: &str, password: &str, name: &str) {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        state.users.insert(
            username.to_string(),
            StubUser {
                username: username.to_string(),
                password: password.to_string(),
                name: name.to_string(),
                created_at: now,
                updated_at: now,
                favorites: Vec::new(),
            },
        );
    }

    /// Inserts a story at the head of the feed. Returns its id.
    pub fn seed_story(&self, username: &str, title: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let url = format!("https://example.com/{}", title.replace(' ', "-"));
        state
            .insert_story(username, "Example Author", title, &url)
            .story_id
    }

    /// Marks a seeded story as one of the user's favorites.
    pub fn seed_favorite(&self, username: &str, story_id: &str) {
        let mut state = self.state.lock().unwrap();
        let user = state.users.get_mut(username).expect("Unknown user");
        if !user.favorites.contains(&story_id.to_string()) {
            user.favorites.push(story_id.to_string());
        }
    }

    /// Mints a valid session token for a seeded user, as if they had
    /// logged in from another client.
    pub fn seed_session(&self, username: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.register_token(username)
    }

    // ========================================================================
    // State inspection
    // ========================================================================

    /// Number of requests handled, excluding readiness probes.
    pub fn request_count(&self) -> u64 {
        self.state.lock().unwrap().request_count
    }

    pub fn story_count(&self) -> usize {
        self.state.lock().unwrap().stories.len()
    }

    pub fn has_story(&self, story_id: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .stories
            .iter()
            .any(|story| story.story_id == story_id)
    }

    pub fn has_user(&self, username: &str) -> bool {
        self.state.lock().unwrap().users.contains_key(username)
    }

    /// The user's favorite story ids, in favoriting order.
    pub fn favorites_of(&self, username: &str) -> Vec<String> {
        self.state.lock().unwrap().users[username].favorites.clone()
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
