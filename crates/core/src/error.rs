//! Error types for the Recall pipeline.
//!
//! This module defines a unified error enum covering every failure category
//! in the pipeline: the three ingestion sources, the embedding collaborator,
//! the index store, and the ambient concerns (configuration, I/O,
//! serialization, timeouts, rebuild serialization).

use thiserror::Error;

/// Unified error type for the Recall pipeline.
///
/// All functions in the workspace return `RecallResult<T>`.
/// We never panic — errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum RecallError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local document source errors (missing or unparsable files)
    #[error("Read error: {0}")]
    Read(String),

    /// Audit database errors (connection or query failures)
    #[error("Query error: {0}")]
    Query(String),

    /// Incident tracker API errors (transport, status, auth)
    #[error("API error: {0}")]
    Api(String),

    /// Embedding service errors (unavailable or malformed responses)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Index store errors (corrupt or missing index, shape mismatches)
    #[error("Index error: {0}")]
    Index(String),

    /// An external call exceeded the configured timeout
    #[error("{0} timed out after {1}s")]
    Timeout(String, u64),

    /// A rebuild was requested while another rebuild was in progress
    #[error("a rebuild is already in progress")]
    Busy,

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RecallError {
    fn from(err: serde_json::Error) -> Self {
        RecallError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for RecallError {
    fn from(err: serde_yaml::Error) -> Self {
        RecallError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with RecallError.
pub type RecallResult<T> = Result<T, RecallError>;
