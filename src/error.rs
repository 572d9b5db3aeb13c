//! Error types for citeguard.

use thiserror::Error;

/// Result type alias using citeguard's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during citation processing.
#[derive(Error, Debug)]
pub enum Error {
    /// Source fetch failed at the transport level
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Timeout during operation
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// External judgment service error
    #[error("Judgment service error: {service} - {message}")]
    Judgment { service: String, message: String },

    /// Source-discovery service error
    #[error("Source search error: {0}")]
    Search(String),

    /// Citation store error
    #[error("Store error: {0}")]
    Store(String),

    /// Archive file I/O error
    #[error("Archive error: {0}")]
    Archive(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A rewrite failed a structural safety check
    #[error("Rewrite rejected: {0}")]
    RewriteRejected(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a fetch error.
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }

    /// Create a judgment service error.
    pub fn judgment(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Judgment {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }
}
