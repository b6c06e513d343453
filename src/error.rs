// Error handling module
// Defines the error taxonomy shared by authentication and storage operations

use thiserror::Error;

/// Errors that can occur while talking to the storage service
#[derive(Error, Debug)]
pub enum StorageError {
    /// Token lifetime from the auth server is not a non-negative integer
    #[error("Invalid token lifetime: {0:?}")]
    InvalidLifetime(String),

    /// Authentication exchange returned something other than 204
    #[error("Authentication failed: unexpected status {status}")]
    AuthenticationFailed { status: u16 },

    /// Storage request returned a non-success status
    #[error("Storage request failed: {status} - {url}")]
    HttpStatus { status: u16, url: String },

    /// Required header absent from the auth response
    #[error("Missing response header: {0}")]
    MissingHeader(&'static str),

    /// Transport-level failure from the HTTP client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local file or reader failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed listing body
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration or header value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StorageError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            StorageError::AuthenticationFailed { status } => Some(*status),
            StorageError::HttpStatus { status, .. } => Some(*status),
            StorageError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this is a 404 from the storage endpoint
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::HttpStatus { status: 404, .. })
    }
}

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
