//! Session lifecycle: the anonymous/authenticated state machine.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::session_store::{SessionStore, StoredCredentials};
use crate::user::User;

/// Client session state.
///
/// There is no half-authenticated state: a session either carries a fully
/// constructed [`User`] (token attached, views populated) or nothing.
#[derive(Debug)]
pub enum Session {
    Anonymous,
    Authenticated(User),
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Session::Authenticated(user) => Some(user),
            Session::Anonymous => None,
        }
    }
}

/// Owns the session state, the service client, and the credential store.
///
/// This is the only component that writes to the session store. Store
/// failures never fail a session operation: persistence degrades to
/// this-process-only and the failure is logged at warn level.
pub struct SessionManager {
    api: Arc<ApiClient>,
    store: Arc<dyn SessionStore>,
    session: Session,
}

impl SessionManager {
    /// Create a manager with no active session.
    pub fn new(api: Arc<ApiClient>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            api,
            store,
            session: Session::Anonymous,
        }
    }

    /// Handle to the service client, for story-feed operations.
    pub fn api(&self) -> Arc<ApiClient> {
        Arc::clone(&self.api)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.user()
    }

    pub fn current_user_mut(&mut self) -> Option<&mut User> {
        match &mut self.session {
            Session::Authenticated(user) => Some(user),
            Session::Anonymous => None,
        }
    }

    /// Create an account and open a session for it.
    ///
    /// On success the new user (story views empty, as the service creates
    /// them) becomes the authenticated user and the credential is
    /// persisted. On error the session stays as it was.
    pub async fn sign_up(
        &mut self,
        username: &str,
        password: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        let (record, token) = self.api.sign_up(username, password, name).await?;
        info!("Signed up user {}", record.username);
        self.open_session(User::from_record(record, token));
        Ok(())
    }

    /// Log in and open a session, replacing any current one.
    ///
    /// The user is fully constructed from the login response, favorites
    /// and own stories included. On error the session stays as it was.
    pub async fn log_in(&mut self, username: &str, password: &str) -> Result<(), ApiError> {
        let (record, token) = self.api.log_in(username, password).await?;
        info!("Logged in user {}", record.username);
        self.open_session(User::from_record(record, token));
        Ok(())
    }

    /// Try to resume the session persisted by a previous run.
    ///
    /// Returns true if a session was restored. Every failure path leaves
    /// the session anonymous and returns false instead of raising: an
    /// empty or unreadable store (no remote call is made in that case), a
    /// rejected or expired credential, or an unreachable service. Stored
    /// credentials survive a failed restore; only [`SessionManager::log_out`]
    /// clears them.
    pub async fn restore_session(&mut self) -> bool {
        let credentials = match self.store.load() {
            Ok(Some(credentials)) => credentials,
            Ok(None) => {
                debug!("No stored session");
                return false;
            }
            Err(err) => {
                warn!("Failed to read session store: {}", err);
                return false;
            }
        };

        match self
            .api
            .fetch_user(&credentials.token, &credentials.username)
            .await
        {
            Ok(record) => {
                info!("Restored session for {}", record.username);
                self.session = Session::Authenticated(User::from_record(record, credentials.token));
                true
            }
            Err(err) if err.is_auth_failure() => {
                info!(
                    "Stored session for {} is no longer valid",
                    credentials.username
                );
                self.session = Session::Anonymous;
                false
            }
            Err(err) => {
                warn!("Could not restore session: {}", err);
                self.session = Session::Anonymous;
                false
            }
        }
    }

    /// Drop the current session and clear the persisted credential.
    ///
    /// Purely local; the token is not revoked on the service.
    pub fn log_out(&mut self) {
        if let Err(err) = self.store.clear() {
            warn!("Failed to clear session store: {}", err);
        }
        self.session = Session::Anonymous;
        info!("Logged out");
    }

    /// Install `user` as the authenticated user and persist its credential.
    fn open_session(&mut self, user: User) {
        let credentials = StoredCredentials {
            token: user.token().clone(),
            username: user.username().to_string(),
        };
        if let Err(err) = self.store.save(&credentials) {
            warn!("Failed to persist session: {}", err);
        }
        self.session = Session::Authenticated(user);
    }
}
