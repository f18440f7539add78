// src/error.rs

//! Error types shared by the library

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while listing, fetching or resolving plugins
#[derive(Error, Debug)]
pub enum Error {
    /// Artifact, version or catalog neighbor does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network fetch exhausted its retry budget (or failed permanently)
    #[error("Download failed for {url}: {reason}")]
    DownloadError { url: String, reason: String },

    /// Malformed version string, manifest tuple or feed document
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A discovered dependency requires more than a caller-pinned version
    #[error(
        "Pin conflict: {required_by} requires {name}:{required} but {name} is pinned to {pinned}"
    )]
    PinConflict {
        name: String,
        pinned: String,
        required: String,
        required_by: String,
    },

    /// Filesystem failure (cache directory, temp files)
    #[error("I/O error: {0}")]
    IoError(String),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Whether the error is a pin conflict (the only kind fix-mode downgrades)
    pub fn is_pin_conflict(&self) -> bool {
        matches!(self, Error::PinConflict { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}
