//! Storefront API errors

use thiserror::Error;

/// Error returned by the storefront API client
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure: connect, timeout, body read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Success status with an empty or unexpected body
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Unknown product or category id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Payload refused by the API (400, 422)
    #[error("Rejected by the API ({status}): {body}")]
    Validation { status: u16, body: String },

    /// Any other non-success status
    #[error("Storefront API returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status behind the error, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Unauthorized => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::Validation { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::InvalidResponse(_) | Self::Serialization(_) => None,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
