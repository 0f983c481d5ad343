//! User entity, its derived story views, and profile updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::payloads::UserRecord;
use crate::api::{ApiClient, ApiError};
use crate::story::{Story, StoryId};

/// Opaque session credential issued at signup or login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken(pub String);

/// Profile fields a user can change about themselves.
#[derive(Debug, Clone, Serialize)]
pub struct ProfilePatch {
    pub name: String,
}

/// The authenticated user's account data plus its two derived story views.
///
/// `favorites` and `own_stories` are projections of server state. They are
/// replaced wholesale by [`User::refresh`], or adjusted by the operations
/// that mirror a change the service has already confirmed; they are never
/// merged, and direct mutation is not exposed.
#[derive(Debug, Clone)]
pub struct User {
    username: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    token: AuthToken,
    favorites: Vec<Story>,
    own_stories: Vec<Story>,
}

impl User {
    /// Build a user from a service record plus the session token that
    /// authenticates it.
    pub fn from_record(record: UserRecord, token: AuthToken) -> Self {
        Self {
            username: record.username,
            name: record.name,
            created_at: record.created_at,
            updated_at: record.updated_at,
            token,
            favorites: record.favorites.into_iter().map(Story::from).collect(),
            own_stories: record.stories.into_iter().map(Story::from).collect(),
        }
    }

    /// Account handle; immutable for the lifetime of the account.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The session token authenticating this user's requests.
    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    /// Favorited stories, in server order.
    pub fn favorites(&self) -> &[Story] {
        &self.favorites
    }

    /// Stories this user posted, in server order.
    pub fn own_stories(&self) -> &[Story] {
        &self.own_stories
    }

    /// True if the story is currently in the local favorites view.
    pub fn is_favorite(&self, story_id: &StoryId) -> bool {
        self.favorites
            .iter()
            .any(|story| story.story_id() == story_id)
    }

    /// Refetch this user's record and replace local state with it.
    ///
    /// `name`, the timestamps, and both story views are replaced
    /// wholesale. This is the one mechanism that brings the derived views
    /// back to server truth; on error nothing changes.
    pub async fn refresh(&mut self, api: &ApiClient) -> Result<(), ApiError> {
        let record = api.fetch_user(&self.token, &self.username).await?;
        debug!("Refreshed user {}", record.username);
        self.name = record.name;
        self.created_at = record.created_at;
        self.updated_at = record.updated_at;
        self.favorites = record.favorites.into_iter().map(Story::from).collect();
        self.own_stories = record.stories.into_iter().map(Story::from).collect();
        Ok(())
    }

    /// Favorite a story, then refresh to pick up the server's view.
    ///
    /// Favoriting a story that is already a favorite is accepted by the
    /// service and still leaves a single entry. On error no refresh
    /// happens and local state is unchanged.
    pub async fn add_favorite(
        &mut self,
        api: &ApiClient,
        story_id: &StoryId,
    ) -> Result<(), ApiError> {
        api.add_favorite(&self.token, &self.username, story_id)
            .await?;
        self.refresh(api).await
    }

    /// Unfavorite a story, then refresh to pick up the server's view.
    ///
    /// Removing a story that is not a favorite is accepted by the service
    /// as a no-op. On error no refresh happens and local state is
    /// unchanged.
    pub async fn remove_favorite(
        &mut self,
        api: &ApiClient,
        story_id: &StoryId,
    ) -> Result<(), ApiError> {
        api.remove_favorite(&self.token, &self.username, story_id)
            .await?;
        self.refresh(api).await
    }

    /// Change profile fields.
    ///
    /// Only `name` and `updated_at` are applied from the response; the
    /// story views keep their current contents (this response does not
    /// carry them, and an absent list is not an empty list).
    pub async fn update_profile(
        &mut self,
        api: &ApiClient,
        patch: &ProfilePatch,
    ) -> Result<(), ApiError> {
        let record = api.update_user(&self.token, &self.username, patch).await?;
        self.name = record.name;
        self.updated_at = record.updated_at;
        Ok(())
    }

    /// Delete this account on the service.
    ///
    /// No local cleanup happens here; the caller drops the value and the
    /// session manager clears the stored credential on logout.
    pub async fn delete_account(&self, api: &ApiClient) -> Result<(), ApiError> {
        api.delete_user(&self.token, &self.username).await
    }

    /// Mirror a confirmed story creation into the own-stories view.
    pub(crate) fn prepend_own_story(&mut self, story: Story) {
        self.own_stories.insert(0, story);
    }

    /// Mirror a confirmed story deletion out of the own-stories view.
    pub(crate) fn remove_own_story(&mut self, story_id: &StoryId) {
        self.own_stories
            .retain(|story| story.story_id() != story_id);
    }
}
