//! Error types for gitmirror

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for gitmirror operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for gitmirror operations
#[derive(Error, Debug)]
pub enum Error {
    /// Raw URL could not be split into host, owner and name
    #[error("Invalid repository URL '{0}': expected scheme://host/owner/name or user@host:owner/name")]
    UrlFormat(String),

    /// An explicitly requested key file could not be loaded
    #[error("Failed to load SSH key {}: {reason}", path.display())]
    AuthLoad {
        /// Path of the key file
        path: PathBuf,
        /// Why loading failed
        reason: String,
    },

    /// Git transport error (clone, remote, push)
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// Error returned by a hosting provider API
    #[error("Hosting provider error: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap a provider-specific error so it crosses the `Hub` boundary unchanged
    pub fn provider(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Provider(Box::new(err))
    }
}
