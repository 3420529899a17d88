//! Error types for the drive_archiver crate.

use thiserror::Error;

/// Errors that can occur while archiving a Drive folder.
#[derive(Error, Debug)]
pub enum ArchiverError {
    #[error("Couldn't find root directory: {0}")]
    RootNotFound(String),

    #[error("Client secrets not found. Add them to {0}")]
    MissingClientSecrets(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Could not determine home directory")]
    HomeDirNotFound,
}

/// Result type alias for ArchiverError.
pub type Result<T> = std::result::Result<T, ArchiverError>;
