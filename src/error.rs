//! Error types for leetsync

use thiserror::Error;

/// Result type alias using leetsync's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in leetsync operations
#[derive(Error, Debug)]
pub enum Error {
    /// GitHub API returned an unexpected response
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// The upsert was rejected because the revision token was stale or missing
    #[error("conflict writing {path}: revision token is stale or missing")]
    Conflict {
        /// Path that was being written
        path: String,
    },

    /// The remote store reported that a path (or its parent) does not exist
    #[error("not found: {path}")]
    NotFound {
        /// Path that was being written
        path: String,
    },

    /// Authentication failure
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Configuration problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local key-value store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Editor text could not be read
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// A submission record failed validation
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A bounded wait elapsed
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Malformed input
    #[error("Parse error: {0}")]
    Parse(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Octocrab error
    #[error("GitHub client error: {0}")]
    Octocrab(#[from] octocrab::Error),

    /// Internal invariant violated
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether re-running directory bootstrap and retrying once may succeed
    pub const fn is_retryable_write(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::NotFound { .. })
    }
}
