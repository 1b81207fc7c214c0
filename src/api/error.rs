//! Transport errors for forms service calls

use reqwest::StatusCode;
use thiserror::Error;

/// Error type for forms service requests
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network, TLS or timeout failure
    #[error("network error: {0}")]
    Network(String),
    /// 401 Unauthorized
    #[error("authentication failed (401); check the configured credentials")]
    Unauthorized,
    /// 403 Forbidden
    #[error("access denied (403)")]
    Forbidden,
    /// 404 Not Found
    #[error("not found: {0}")]
    NotFound(String),
    /// Any other non-success status
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },
    /// Body was not the JSON we asked for
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Map a non-2xx status and its body to an error
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::Forbidden,
            StatusCode::NOT_FOUND => ApiError::NotFound(if body.is_empty() {
                "resource not found".to_string()
            } else {
                body
            }),
            other => ApiError::Status {
                status: other.as_u16(),
                body,
            },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Network(format!("request timed out: {e}"))
        } else if e.is_connect() {
            ApiError::Network(format!("connection failed: {e}"))
        } else if e.is_decode() {
            ApiError::InvalidResponse(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}
