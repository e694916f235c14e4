//! Error types for polynest.

use thiserror::Error;

/// Result type alias using the polynest [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the nesting engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A polygon is degenerate or otherwise unusable.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The bin polygon is degenerate or collapses after offsetting.
    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),

    /// A configuration value is out of range.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A wire buffer is truncated or malformed.
    #[error("Buffer error: {0}")]
    BufferError(String),

    /// The point pool has no contiguous run of free slots large enough.
    #[error("Point pool exhausted: requested {requested}, available {available}")]
    PoolExhausted {
        /// Number of points requested.
        requested: usize,
        /// Number of free slots left in the pool.
        available: usize,
    },

    /// A worker job faulted.
    #[error("Worker error: {0}")]
    WorkerError(String),

    /// The run was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// Internal invariant violation.
    #[error("Internal error: {0}")]
    Internal(String),
}
