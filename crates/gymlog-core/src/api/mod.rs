//! REST API client module for the gym API.
//!
//! This module provides the `ApiClient` for exchanging credentials,
//! managing the account, and browsing and logging exercises.
//!
//! Authenticated requests carry the bearer token issued by
//! `POST /sessions`.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::{user_message, ApiError, ErrorClass};
