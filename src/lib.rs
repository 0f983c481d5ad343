//! Storynest Client Library
//!
//! Client-side data layer for the Storynest story-sharing service:
//! remote API access, session persistence, and the entity types that
//! keep local state consistent with the server.

pub mod api;
pub mod config;
pub mod session;
pub mod session_store;
pub mod story;
pub mod user;

// Re-export commonly used types for convenience
pub use api::{ApiClient, ApiError};
pub use config::ClientConfig;
pub use session::{Session, SessionManager};
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore, StoredCredentials};
pub use story::{Story, StoryDraft, StoryId, StoryList, StoryPatch};
pub use user::{AuthToken, ProfilePatch, User};
