//! Durable key-value storage for the persisted session.
//!
//! This module provides:
//! - `KeyValueStore`: async get/set/remove over string keys
//! - `FileStore`: one file per key under the data directory
//! - `KeyringStore`: values kept in the OS keychain
//! - `MemoryStore`: process-local, for tests and ephemeral sessions
//!
//! The session is persisted as two independent records, the user
//! (JSON) under [`USER_STORAGE_KEY`] and the raw token under
//! [`AUTH_TOKEN_STORAGE_KEY`]. See the `records` helpers.

pub mod file;
pub mod keychain;
pub mod memory;
pub mod records;

use anyhow::Result;
use async_trait::async_trait;

pub use file::FileStore;
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

/// Key holding the signed-in user, serialized as JSON
pub const USER_STORAGE_KEY: &str = "@gymlog:user";

/// Key holding the raw bearer token
pub const AUTH_TOKEN_STORAGE_KEY: &str = "@gymlog:token";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Missing keys are `Ok(None)`.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key succeeds.
    async fn remove_item(&self, key: &str) -> Result<()>;
}
