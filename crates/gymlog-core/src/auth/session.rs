use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::models::{ProfileUpdate, SignUpRequest, User};
use crate::storage::{records, KeyValueStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No restore attempt has finished yet
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Consistent view of the session at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_loading: bool,
}

struct SessionState {
    status: SessionStatus,
    user: Option<User>,
    /// Carries the bearer token as its default header once signed in
    api: ApiClient,
    is_loading: bool,
}

impl SessionState {
    fn clear(&mut self) {
        self.status = SessionStatus::Unauthenticated;
        self.user = None;
        self.api.clear_token();
    }
}

/// Owns the signed-in user and bearer token for the life of the process.
///
/// Construct one at startup, call [`SessionManager::restore_session`], and
/// hand a shared reference to whatever needs the session. Mutating
/// operations are serialized, so a sign-out cannot interleave with a
/// sign-in in flight. Reads never wait on the network.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    state: RwLock<SessionState>,
    ops: Mutex<()>,
}

impl SessionManager {
    pub fn new(mut api: ApiClient, store: Arc<dyn KeyValueStore>) -> Self {
        api.clear_token();

        Self {
            store,
            state: RwLock::new(SessionState {
                status: SessionStatus::Unknown,
                user: None,
                api,
                is_loading: true,
            }),
            ops: Mutex::new(()),
        }
    }

    // ===== Accessors =====

    pub async fn status(&self) -> SessionStatus {
        self.state.read().await.status
    }

    pub async fn is_authenticated(&self) -> bool {
        self.status().await == SessionStatus::Authenticated
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.api.token().map(str::to_string)
    }

    /// True until the startup restore finishes, and while signing out
    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            status: state.status,
            user: state.user.clone(),
            token: state.api.token().map(str::to_string),
            is_loading: state.is_loading,
        }
    }

    /// API client carrying the current bearer token, if any
    pub async fn client(&self) -> ApiClient {
        self.state.read().await.api.clone()
    }

    // ===== Lifecycle =====

    /// Recover the session persisted by a previous run.
    ///
    /// Both the user and the token must be stored; either alone counts as
    /// no session. On a read or parse failure the session is left
    /// unauthenticated and the error returned. Loading is cleared on every
    /// path.
    pub async fn restore_session(&self) -> Result<SessionStatus> {
        let _guard = self.ops.lock().await;

        let loaded = self.load_persisted().await;

        let mut state = self.state.write().await;
        state.is_loading = false;
        match loaded {
            Ok(Some((user, token))) => {
                debug!(user_id = %user.id, "Restored persisted session");
                state.api.set_token(token);
                state.user = Some(user);
                state.status = SessionStatus::Authenticated;
            }
            Ok(None) => {
                debug!("No persisted session");
                state.clear();
            }
            Err(e) => {
                warn!(error = %e, "Failed to restore session");
                state.clear();
                return Err(e);
            }
        }
        Ok(state.status)
    }

    async fn load_persisted(&self) -> Result<Option<(User, String)>> {
        let user = records::load_user(self.store.as_ref()).await?;
        let token = records::load_token(self.store.as_ref()).await?;

        match (user, token) {
            (Some(user), Some(token)) => Ok(Some((user, token))),
            (Some(_), None) | (None, Some(_)) => {
                debug!("Persisted session is incomplete, ignoring it");
                Ok(None)
            }
            (None, None) => Ok(None),
        }
    }

    /// Exchange credentials for a session.
    ///
    /// The user and token are persisted before the in-memory state changes.
    /// On any failure the current state is left as it was.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        let _guard = self.ops.lock().await;
        self.sign_in_locked(email, password).await
    }

    async fn sign_in_locked(&self, email: &str, password: &str) -> Result<User> {
        // Credentials are exchanged without any bearer token
        let mut api = self.client().await;
        api.clear_token();
        let session = api.sign_in(email, password).await?;

        if let Err(e) = self.persist_session(&session.user, &session.token).await {
            self.restore_persisted_records().await;
            return Err(e);
        }

        let mut state = self.state.write().await;
        state.api.set_token(session.token);
        state.user = Some(session.user.clone());
        state.status = SessionStatus::Authenticated;

        info!(user_id = %session.user.id, "Signed in");
        Ok(session.user)
    }

    async fn persist_session(&self, user: &User, token: &str) -> Result<()> {
        records::save_user(self.store.as_ref(), user).await?;
        records::save_token(self.store.as_ref(), token).await
    }

    /// After a failed write, put the store back in line with memory: the
    /// current pair if signed in, otherwise no records at all. Best effort;
    /// if the current pair cannot be put back both records are removed.
    async fn restore_persisted_records(&self) {
        let current = {
            let state = self.state.read().await;
            match (state.status, &state.user, state.api.token()) {
                (SessionStatus::Authenticated, Some(user), Some(token)) => {
                    Some((user.clone(), token.to_string()))
                }
                _ => None,
            }
        };

        if let Some((user, token)) = current {
            let store = self.store.as_ref();
            let user_written = records::save_user(store, &user).await.is_ok();
            // A token write that fails again still leaves the current token in place
            let token_in_place = records::save_token(store, &token).await.is_ok()
                || matches!(records::load_token(store).await, Ok(Some(ref stored)) if *stored == token);
            if user_written && token_in_place {
                return;
            }
            warn!("Failed to rewrite the current session, removing stored records");
        }

        if let Err(e) = records::remove_user(self.store.as_ref()).await {
            warn!(error = %e, "Failed to remove stored user");
        }
        if let Err(e) = records::remove_token(self.store.as_ref()).await {
            warn!(error = %e, "Failed to remove stored token");
        }
    }

    /// Register an account, then sign in with the same credentials.
    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<User> {
        let _guard = self.ops.lock().await;

        let mut api = self.client().await;
        api.clear_token();
        api.sign_up(request).await?;
        info!("Account created");

        self.sign_in_locked(&request.email, &request.password).await
    }

    /// Forget the session in memory, then remove both persisted records.
    ///
    /// Both removals are attempted even if the first fails; the first
    /// failure is returned.
    pub async fn sign_out(&self) -> Result<()> {
        let _guard = self.ops.lock().await;

        {
            let mut state = self.state.write().await;
            state.is_loading = true;
            state.clear();
        }

        let user_removed = records::remove_user(self.store.as_ref()).await;
        let token_removed = records::remove_token(self.store.as_ref()).await;

        self.state.write().await.is_loading = false;

        if let Err(ref e) = user_removed {
            warn!(error = %e, "Failed to remove stored user");
        }
        if let Err(ref e) = token_removed {
            warn!(error = %e, "Failed to remove stored token");
        }
        info!("Signed out");

        user_removed.and(token_removed)
    }

    // ===== Profile =====

    /// Replace the signed-in user and persist it. The token is untouched.
    ///
    /// The in-memory user is replaced even when persisting fails.
    pub async fn update_user_profile(&self, user: User) -> Result<()> {
        let _guard = self.ops.lock().await;
        self.update_user_profile_locked(user).await
    }

    async fn update_user_profile_locked(&self, user: User) -> Result<()> {
        self.state.write().await.user = Some(user.clone());
        records::save_user(self.store.as_ref(), &user).await
    }

    /// Send a profile change to the server, then adopt the new name locally.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        let _guard = self.ops.lock().await;

        let (api, current) = {
            let state = self.state.read().await;
            match (state.status, state.user.clone()) {
                (SessionStatus::Authenticated, Some(user)) => (state.api.clone(), user),
                _ => return Err(anyhow!("Not signed in")),
            }
        };

        api.update_profile(update)
            .await
            .context("Failed to update profile")?;

        let updated = User {
            name: update.name.clone(),
            ..current
        };
        self.update_user_profile_locked(updated.clone()).await?;

        debug!(user_id = %updated.id, password_changed = update.changes_password(), "Profile updated");
        Ok(updated)
    }
}
