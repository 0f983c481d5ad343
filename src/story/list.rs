//! The story feed and its mutation rules.

use tracing::debug;

use super::{Story, StoryDraft, StoryId};
use crate::api::{ApiClient, ApiError};
use crate::user::User;

/// An ordered snapshot of the service's story feed, newest first.
///
/// A list is built by [`StoryList::fetch_all`] and then adjusted only by
/// its own mutation methods, each of which mirrors a change the service
/// has already confirmed. There is no partial merge with the server: a
/// stale list is replaced by fetching a new one.
#[derive(Debug, Clone, Default)]
pub struct StoryList {
    stories: Vec<Story>,
}

impl StoryList {
    /// Fetch the current feed as a new list.
    ///
    /// Always returns a fresh snapshot; existing lists are never patched
    /// in place.
    pub async fn fetch_all(api: &ApiClient) -> Result<StoryList, ApiError> {
        let records = api.fetch_stories().await?;
        let stories = records.into_iter().map(Story::from).collect();
        Ok(StoryList { stories })
    }

    /// Stories in feed order.
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// Find a story by id.
    pub fn get(&self, story_id: &StoryId) -> Option<&Story> {
        self.stories
            .iter()
            .find(|story| story.story_id() == story_id)
    }

    /// Find a story by id for editing through [`Story::update`].
    pub fn get_mut(&mut self, story_id: &StoryId) -> Option<&mut Story> {
        self.stories
            .iter_mut()
            .find(|story| story.story_id() == story_id)
    }

    /// Post a new story as `user`.
    ///
    /// On success the canonical story the service created is prepended to
    /// this list and to the user's own stories, and returned. On error
    /// neither collection changes.
    pub async fn create_story(
        &mut self,
        api: &ApiClient,
        user: &mut User,
        draft: &StoryDraft,
    ) -> Result<Story, ApiError> {
        let record = api.create_story(user.token(), draft).await?;
        let story = Story::from(record);
        debug!("Created story {}", story.story_id());
        self.stories.insert(0, story.clone());
        user.prepend_own_story(story.clone());
        Ok(story)
    }

    /// Delete a story owned by `user`.
    ///
    /// On success every entry with that id is removed from this list and
    /// from the user's own stories. The user's favorites view is
    /// deliberately left alone: if the owner had favorited their own
    /// story, the stale favorite remains visible until the next
    /// [`User::refresh`] restores server truth. On error neither
    /// collection changes.
    ///
    /// Deleting a story that is not in this list still issues the remote
    /// delete; the local removals are then no-ops.
    pub async fn delete_story(
        &mut self,
        api: &ApiClient,
        user: &mut User,
        story_id: &StoryId,
    ) -> Result<(), ApiError> {
        api.delete_story(user.token(), story_id).await?;
        debug!("Deleted story {}", story_id);
        self.stories.retain(|story| story.story_id() != story_id);
        user.remove_own_story(story_id);
        Ok(())
    }
}
