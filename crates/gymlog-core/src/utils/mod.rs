//! Utility functions for display formatting.

pub mod format;

pub use format::{capitalize, format_sets, truncate_string};
