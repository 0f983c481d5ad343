//! In-memory session store for tests and embedded use.

use std::sync::Mutex;

use super::{SessionStore, SessionStoreError, StoredCredentials};

/// Session store that lives and dies with the process.
#[derive(Default)]
pub struct MemorySessionStore {
    credentials: Mutex<Option<StoredCredentials>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, credentials: &StoredCredentials) -> Result<(), SessionStoreError> {
        *self.credentials.lock().unwrap() = Some(credentials.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<StoredCredentials>, SessionStoreError> {
        Ok(self.credentials.lock().unwrap().clone())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        *self.credentials.lock().unwrap() = None;
        Ok(())
    }
}
