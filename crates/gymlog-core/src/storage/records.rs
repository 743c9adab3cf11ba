//! Typed access to the two persisted session records.
//!
//! Empty stored values read as absent, matching a store that was
//! cleared by writing blanks rather than removing keys.

use anyhow::{Context, Result};

use crate::models::User;

use super::{KeyValueStore, AUTH_TOKEN_STORAGE_KEY, USER_STORAGE_KEY};

pub async fn save_user(store: &dyn KeyValueStore, user: &User) -> Result<()> {
    let contents = serde_json::to_string(user).context("Failed to serialize user")?;
    store
        .set_item(USER_STORAGE_KEY, &contents)
        .await
        .context("Failed to persist user")
}

pub async fn load_user(store: &dyn KeyValueStore) -> Result<Option<User>> {
    let stored = store
        .get_item(USER_STORAGE_KEY)
        .await
        .context("Failed to read stored user")?;

    match stored.as_deref().map(str::trim) {
        None | Some("") | Some("{}") => Ok(None),
        Some(contents) => {
            let user = serde_json::from_str(contents).context("Failed to parse stored user")?;
            Ok(Some(user))
        }
    }
}

pub async fn remove_user(store: &dyn KeyValueStore) -> Result<()> {
    store
        .remove_item(USER_STORAGE_KEY)
        .await
        .context("Failed to remove stored user")
}

pub async fn save_token(store: &dyn KeyValueStore, token: &str) -> Result<()> {
    store
        .set_item(AUTH_TOKEN_STORAGE_KEY, token)
        .await
        .context("Failed to persist auth token")
}

pub async fn load_token(store: &dyn KeyValueStore) -> Result<Option<String>> {
    let stored = store
        .get_item(AUTH_TOKEN_STORAGE_KEY)
        .await
        .context("Failed to read stored auth token")?;
    Ok(stored.filter(|token| !token.trim().is_empty()))
}

pub async fn remove_token(store: &dyn KeyValueStore) -> Result<()> {
    store
        .remove_item(AUTH_TOKEN_STORAGE_KEY)
        .await
        .context("Failed to remove stored auth token")
}
