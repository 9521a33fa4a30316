//! Error types shared across the ragstack crates.

use thiserror::Error;

/// Errors that can occur in the RAG pipeline.
///
/// The taxonomy separates permanent configuration faults (never retried)
/// from provider-side faults (retryable by the caller, never inside the
/// core) and from expected "not supported" outcomes.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid configuration: bad chunk parameters, an unknown provider or
    /// backend name, or an embedding-model mismatch between index and query
    /// time. Fatal at startup or first use.
    #[error("configuration error: {0}")]
    Config(String),

    /// The embedding provider failed (rate limit, auth, network).
    #[error("embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The LLM provider failed during generation or streaming.
    #[error("generation error ({provider}): {message}")]
    Generation {
        /// The LLM provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector index backend failed (storage or remote service).
    #[error("index error ({backend}): {message}")]
    Index {
        /// The vector index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The requested operation is not supported by the configured backend.
    /// This is an expected outcome, not a crash.
    #[error("operation '{operation}' is not supported by the {backend} backend")]
    Unsupported {
        /// The backend that rejected the operation.
        backend: String,
        /// The operation that was requested.
        operation: String,
    },

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
