//! Data models for gymlog entities.
//!
//! This module contains the data structures exchanged with the gym API:
//!
//! - `User`, `SignUpRequest`, `ProfileUpdate`: account and profile types
//! - `AuthenticatedSession`: the result of a credential exchange
//! - `Exercise`: an exercise belonging to a muscle group
//! - `HistoryEntry`, `HistoryByDay`: logged workouts grouped by day

pub mod exercise;
pub mod history;
pub mod user;

pub use exercise::Exercise;
pub use history::{HistoryByDay, HistoryEntry};
pub use user::{AuthenticatedSession, ProfileUpdate, SignUpRequest, User};
