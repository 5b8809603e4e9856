//! Error types for ebay_sync

use std::fmt;

/// Unified error type for ebay_sync operations
#[derive(Debug)]
pub enum SyncError {
    /// HTTP request failed (network error, timeout, etc.)
    Transport(reqwest::Error),
    /// HTTP error status code from the Trading API endpoint
    HttpStatus(reqwest::StatusCode),
    /// Failed to parse a JSON response
    Parse(serde_json::Error),
    /// Database operation failed
    Database(rusqlite::Error),
    /// Invalid or missing configuration, detected before any network activity
    Config(String),
    /// A category referenced a parent that does not exist one level up
    MissingParent {
        category_id: String,
        parent_id: String,
        level: u32,
    },
    /// A response was missing a field the Trading API guarantees
    MalformedResponse(String),
    /// Filesystem failure while writing a cache snapshot
    Io(std::io::Error),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Transport(e) => write!(f, "Transport error: {}", e),
            SyncError::HttpStatus(status) => write!(f, "HTTP error: {}", status),
            SyncError::Parse(e) => write!(f, "Parse error: {}", e),
            SyncError::Database(e) => write!(f, "Database error: {}", e),
            SyncError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SyncError::MissingParent {
                category_id,
                parent_id,
                level,
            } => write!(
                f,
                "Category {} (level {}) references missing parent {}",
                category_id, level, parent_id
            ),
            SyncError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
            SyncError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Transport(e) => Some(e),
            SyncError::Parse(e) => Some(e),
            SyncError::Database(e) => Some(e),
            SyncError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Transport(err)
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Parse(err)
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(err: rusqlite::Error) -> Self {
        SyncError::Database(err)
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err)
    }
}

/// Result alias for ebay_sync operations
pub type Result<T> = std::result::Result<T, SyncError>;
