//! HTTP client for the Storynest service.

mod error;
pub mod payloads;

pub use error::ApiError;

use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::story::{StoryDraft, StoryId, StoryPatch};
use crate::user::{AuthToken, ProfilePatch};
use payloads::{
    AuthEnvelope, CreateStoryRequest, ErrorEnvelope, LoginRequest, LoginUser, SignupRequest,
    SignupUser, StoriesEnvelope, StoryEnvelope, StoryRecord, TokenOnly, UpdateStoryRequest,
    UpdateUserRequest, UserEnvelope, UserRecord,
};

/// HTTP client for communicating with the Storynest service.
///
/// One method per service endpoint. Methods take `&self` and can be called
/// concurrently; each one performs exactly one HTTP exchange and returns
/// the decoded payload or an [`ApiError`].
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new service client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the service (e.g., "https://api.storynest.dev")
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: String, timeout_sec: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .expect("Failed to create HTTP client");

        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        Self { client, base_url }
    }

    /// Get the base URL of the service.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // Stories
    // ========================================================================

    /// Fetch the current story feed, in the service's order (newest first).
    pub async fn fetch_stories(&self) -> Result<Vec<StoryRecord>, ApiError> {
        let url = format!("{}/stories", self.base_url);
        debug!("GET {}", url);
        let response = self.send_checked(self.client.get(&url)).await?;
        let envelope: StoriesEnvelope = Self::decode(response).await?;
        Ok(envelope.stories)
    }

    /// Post a new story and return the canonical record the service created.
    pub async fn create_story(
        &self,
        token: &AuthToken,
        draft: &StoryDraft,
    ) -> Result<StoryRecord, ApiError> {
        let url = format!("{}/stories", self.base_url);
        debug!("POST {}", url);
        let body = CreateStoryRequest {
            token,
            story: draft,
        };
        let response = self
            .send_checked(self.client.post(&url).json(&body))
            .await?;
        let envelope: StoryEnvelope = Self::decode(response).await?;
        Ok(envelope.story)
    }

    /// Update mutable story fields and return the updated record.
    pub async fn update_story(
        &self,
        token: &AuthToken,
        story_id: &StoryId,
        patch: &StoryPatch,
    ) -> Result<StoryRecord, ApiError> {
        let url = format!(
            "{}/stories/{}",
            self.base_url,
            urlencoding::encode(&story_id.0)
        );
        debug!("PATCH {}", url);
        let body = UpdateStoryRequest {
            token,
            story: patch,
        };
        let response = self
            .send_checked(self.client.patch(&url).json(&body))
            .await?;
        let envelope: StoryEnvelope = Self::decode(response).await?;
        Ok(envelope.story)
    }

    /// Delete a story. The response body is ignored.
    pub async fn delete_story(&self, token: &AuthToken, story_id: &StoryId) -> Result<(), ApiError> {
        let url = format!(
            "{}/stories/{}",
            self.base_url,
            urlencoding::encode(&story_id.0)
        );
        debug!("DELETE {}", url);
        let body = TokenOnly { token };
        self.send_checked(self.client.delete(&url).json(&body))
            .await?;
        Ok(())
    }

    // ========================================================================
    // Accounts and sessions
    // ========================================================================

    /// Create an account and return the new user record plus its session token.
    pub async fn sign_up(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<(UserRecord, AuthToken), ApiError> {
        let url = format!("{}/signup", self.base_url);
        debug!("POST {}", url);
        let body = SignupRequest {
            user: SignupUser {
                username,
                password,
                name,
            },
        };
        let response = self
            .send_checked(self.client.post(&url).json(&body))
            .await?;
        let envelope: AuthEnvelope = Self::decode(response).await?;
        Ok((envelope.user, envelope.token))
    }

    /// Exchange credentials for the user record plus a session token.
    pub async fn log_in(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(UserRecord, AuthToken), ApiError> {
        let url = format!("{}/login", self.base_url);
        debug!("POST {}", url);
        let body = LoginRequest {
            user: LoginUser { username, password },
        };
        let response = self
            .send_checked(self.client.post(&url).json(&body))
            .await?;
        let envelope: AuthEnvelope = Self::decode(response).await?;
        Ok((envelope.user, envelope.token))
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Fetch a user's full record, including favorites and own stories.
    ///
    /// This endpoint authenticates via a `token` query parameter rather
    /// than a body field.
    pub async fn fetch_user(
        &self,
        token: &AuthToken,
        username: &str,
    ) -> Result<UserRecord, ApiError> {
        let url = format!("{}/users/{}", self.base_url, urlencoding::encode(username));
        debug!("GET {}", url);
        let response = self
            .send_checked(self.client.get(&url).query(&[("token", token.0.as_str())]))
            .await?;
        let envelope: UserEnvelope = Self::decode(response).await?;
        Ok(envelope.user)
    }

    /// Update profile fields and return the updated record.
    ///
    /// The response omits `favorites` and `stories`; they deserialize empty.
    pub async fn update_user(
        &self,
        token: &AuthToken,
        username: &str,
        patch: &ProfilePatch,
    ) -> Result<UserRecord, ApiError> {
        let url = format!("{}/users/{}", self.base_url, urlencoding::encode(username));
        debug!("PATCH {}", url);
        let body = UpdateUserRequest { token, user: patch };
        let response = self
            .send_checked(self.client.patch(&url).json(&body))
            .await?;
        let envelope: UserEnvelope = Self::decode(response).await?;
        Ok(envelope.user)
    }

    /// Delete an account. The response body is ignored.
    pub async fn delete_user(&self, token: &AuthToken, username: &str) -> Result<(), ApiError> {
        let url = format!("{}/users/{}", self.base_url, urlencoding::encode(username));
        debug!("DELETE {}", url);
        let body = TokenOnly { token };
        self.send_checked(self.client.delete(&url).json(&body))
            .await?;
        Ok(())
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    /// Mark a story as one of the user's favorites.
    ///
    /// The response body is ignored; callers refetch the user record to
    /// observe the new favorites list.
    pub async fn add_favorite(
        &self,
        token: &AuthToken,
        username: &str,
        story_id: &StoryId,
    ) -> Result<(), ApiError> {
        let url = self.favorite_url(username, story_id);
        debug!("POST {}", url);
        let body = TokenOnly { token };
        self.send_checked(self.client.post(&url).json(&body))
            .await?;
        Ok(())
    }

    /// Remove a story from the user's favorites.
    ///
    /// The response body is ignored; callers refetch the user record to
    /// observe the new favorites list.
    pub async fn remove_favorite(
        &self,
        token: &AuthToken,
        username: &str,
        story_id: &StoryId,
    ) -> Result<(), ApiError> {
        let url = self.favorite_url(username, story_id);
        debug!("DELETE {}", url);
        let body = TokenOnly { token };
        self.send_checked(self.client.delete(&url).json(&body))
            .await?;
        Ok(())
    }

    fn favorite_url(&self, username: &str, story_id: &StoryId) -> String {
        format!(
            "{}/users/{}/favorites/{}",
            self.base_url,
            urlencoding::encode(username),
            urlencoding::encode(&story_id.0)
        )
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Send a request and turn any non-success status into a Service error.
    async fn send_checked(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::service_error(response).await)
        }
    }

    /// Build a Service error from a failure response, preferring the
    /// service's own error body when it parses.
    async fn service_error(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => envelope.error.message,
            Err(_) => body,
        };
        ApiError::Service { status, message }
    }

    /// Decode a success body, reporting schema mismatches as Decode errors.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }
}
