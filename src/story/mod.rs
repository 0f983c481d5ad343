//! Story entities and the story feed collection.

mod list;

pub use list::StoryList;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::payloads::StoryRecord;
use crate::api::{ApiClient, ApiError};
use crate::user::AuthToken;

/// Opaque unique identifier the service assigns to a story.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoryId(pub String);

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StoryId {
    fn from(value: &str) -> Self {
        StoryId(value.to_string())
    }
}

/// Client-supplied fields for a new story.
///
/// The service assigns the id, the timestamps, and the owning username.
#[derive(Debug, Clone, Serialize)]
pub struct StoryDraft {
    pub author: String,
    pub title: String,
    pub url: String,
}

impl StoryDraft {
    pub fn new(
        author: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Field edits for an existing story. Unset fields are not sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A single story as the client knows it.
///
/// The id is assigned by the service and never changes. The mutable
/// fields change only through [`Story::update`], which applies the
/// service's canonical result or nothing at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    story_id: StoryId,
    author: String,
    title: String,
    url: String,
    username: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StoryRecord> for Story {
    fn from(record: StoryRecord) -> Self {
        Self {
            story_id: record.story_id,
            author: record.author,
            title: record.title,
            url: record.url,
            username: record.username,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl Story {
    pub fn story_id(&self) -> &StoryId {
        &self.story_id
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Handle of the user who posted the story.
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Hostname portion of the story's URL, for compact display.
    ///
    /// Strips the scheme, any path or query, and a leading "www.".
    pub fn host(&self) -> &str {
        let rest = match self.url.find("://") {
            Some(idx) => &self.url[idx + 3..],
            None => self.url.as_str(),
        };
        let host = match rest.split_once('/') {
            Some((host, _)) => host,
            None => rest,
        };
        host.strip_prefix("www.").unwrap_or(host)
    }

    /// Push field edits to the service and apply the canonical result.
    ///
    /// On success `author`, `title`, `url`, and `updated_at` are replaced
    /// from the response. On any error the local story is left untouched.
    pub async fn update(
        &mut self,
        api: &ApiClient,
        token: &AuthToken,
        patch: &StoryPatch,
    ) -> Result<(), ApiError> {
        let record = api.update_story(token, &self.story_id, patch).await?;
        self.author = record.author;
        self.title = record.title;
        self.url = record.url;
        self.updated_at = record.updated_at;
        Ok(())
    }
}
