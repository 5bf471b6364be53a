//! Error types for the ingestion and retrieval core

use thiserror::Error;

/// Result type alias for knowledge-rag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the ingestion pipeline and retrieval engine
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document loading error (fatal to a single document only)
    #[error("Failed to load '{source_name}': {message}")]
    Load { source_name: String, message: String },

    /// Unsupported document source
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// Enhancement error (recoverable; pipeline falls back to plain chunking)
    #[error("Enhancement failed: {0}")]
    Enhancement(String),

    /// Vector index error
    #[error("Vector index error: {0}")]
    Index(String),

    /// Search error
    #[error("Search failed: {0}")]
    Search(String),

    /// Vector index is not ready to accept reads or writes
    #[error("Vector index is not ready")]
    IndexUnavailable,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a load error
    pub fn load(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            source_name: source.into(),
            message: message.into(),
        }
    }

    /// Create an enhancement error
    pub fn enhancement(message: impl Into<String>) -> Self {
        Self::Enhancement(message.into())
    }

    /// Create a vector index error
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index(message.into())
    }

    /// Create a search error
    pub fn search(message: impl Into<String>) -> Self {
        Self::Search(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
