//! Authentication module for managing the user session.
//!
//! This module provides `SessionManager`, which owns the signed-in user
//! and bearer token, persists both through a `KeyValueStore`, and restores
//! them on the next start.

pub mod session;

pub use session::{SessionManager, SessionSnapshot, SessionStatus};
