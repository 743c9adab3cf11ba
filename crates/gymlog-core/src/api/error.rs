use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Failure classified by the server, with a message meant for the user
    #[error("{0}")]
    Domain(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Shape of the server's error bodies: `{"status": "error", "message": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        if let Ok(ErrorBody { message: Some(message) }) = serde_json::from_str::<ErrorBody>(body) {
            if !message.is_empty() {
                return ApiError::Domain(message);
            }
        }

        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound(truncated),
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, ApiError::Domain(_))
    }
}

/// How an error should be presented to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorClass {
    /// The server explained what went wrong; show its message as-is
    Domain(String),
    /// Anything else: network, parsing, storage. Show a generic message.
    Unclassified,
}

impl ErrorClass {
    pub fn of(err: &anyhow::Error) -> Self {
        err.chain()
            .find_map(|cause| match cause.downcast_ref::<ApiError>() {
                Some(ApiError::Domain(message)) => Some(ErrorClass::Domain(message.clone())),
                _ => None,
            })
            .unwrap_or(ErrorClass::Unclassified)
    }
}

/// Message to show for a failed operation: the server's own message when
/// there is one, otherwise `fallback`.
pub fn user_message(err: &anyhow::Error, fallback: &str) -> String {
    match ErrorClass::of(err) {
        ErrorClass::Domain(message) => message,
        ErrorClass::Unclassified => fallback.to_string(),
    }
}
