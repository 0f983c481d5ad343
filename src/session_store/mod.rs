//! Durable storage for session credentials.
//!
//! The store is the client-side analog of browser local storage: it holds
//! at most one credential pair and survives process restarts (for the
//! file-backed implementation). Only the session manager writes to it.

mod file_store;
mod memory_store;

pub use file_store::FileSessionStore;
pub use memory_store::MemorySessionStore;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::user::AuthToken;

/// The credential pair persisted between process runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub token: AuthToken,
    pub username: String,
}

/// Errors that can occur reading or writing the session store.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub trait SessionStore: Send + Sync {
    /// Persists the credential pair, replacing any previous one.
    /// Returns Err if the backing storage is unavailable.
    fn save(&self, credentials: &StoredCredentials) -> Result<(), SessionStoreError>;

    /// Returns the persisted credential pair.
    /// Returns Ok(None) if nothing is stored.
    /// Returns Err if the stored data is unreadable or corrupt.
    fn load(&self) -> Result<Option<StoredCredentials>, SessionStoreError>;

    /// Removes any persisted credential pair.
    /// Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), SessionStoreError>;
}
