//! gymlog core - API client, models, session and storage.
//!
//! Front ends build a [`SessionManager`] from an [`ApiClient`] and a
//! [`storage::KeyValueStore`], restore it once at startup, and use it for
//! everything that needs the signed-in user.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;
pub mod utils;

pub use api::{user_message, ApiClient, ApiError, ErrorClass};
pub use auth::{SessionManager, SessionSnapshot, SessionStatus};
pub use config::{Config, StorageBackend};
