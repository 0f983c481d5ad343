//! Request and response payloads for the Storynest service API.
//!
//! Every request and response body at the service boundary has an explicit
//! schema here. Wire field names are camelCase; unknown fields in responses
//! are ignored so that additive server changes do not break older clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::story::{StoryDraft, StoryId, StoryPatch};
use crate::user::{AuthToken, ProfilePatch};

// ============================================================================
// Response records
// ============================================================================

/// A story as the service returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRecord {
    pub story_id: StoryId,
    pub author: String,
    pub title: String,
    pub url: String,
    /// Handle of the posting user.
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user as the service returns it.
///
/// The wire name for the user's own stories is `stories`. Responses that
/// omit `favorites` or `stories` (profile updates) deserialize them empty;
/// callers must not treat those empty lists as server truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub favorites: Vec<StoryRecord>,
    #[serde(default)]
    pub stories: Vec<StoryRecord>,
}

// ============================================================================
// Response envelopes
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StoriesEnvelope {
    pub stories: Vec<StoryRecord>,
}

#[derive(Debug, Deserialize)]
pub struct StoryEnvelope {
    pub story: StoryRecord,
}

#[derive(Debug, Deserialize)]
pub struct UserEnvelope {
    pub user: UserRecord,
}

/// Signup and login responses carry the user record plus a session token.
#[derive(Debug, Deserialize)]
pub struct AuthEnvelope {
    pub user: UserRecord,
    pub token: AuthToken,
}

/// Error body the service sends on failures: `{"error": {...}}`.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub title: Option<String>,
    pub message: String,
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SignupRequest<'a> {
    pub user: SignupUser<'a>,
}

#[derive(Debug, Serialize)]
pub struct SignupUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub user: LoginUser<'a>,
}

#[derive(Debug, Serialize)]
pub struct LoginUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CreateStoryRequest<'a> {
    pub token: &'a AuthToken,
    pub story: &'a StoryDraft,
}

#[derive(Debug, Serialize)]
pub struct UpdateStoryRequest<'a> {
    pub token: &'a AuthToken,
    pub story: &'a StoryPatch,
}

#[derive(Debug, Serialize)]
pub struct UpdateUserRequest<'a> {
    pub token: &'a AuthToken,
    pub user: &'a ProfilePatch,
}

/// Body for requests that carry only the session token: story deletes,
/// account deletes, and favorite add/remove.
#[derive(Debug, Serialize)]
pub struct TokenOnly<'a> {
    pub token: &'a AuthToken,
}
