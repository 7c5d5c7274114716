//! Error types for kwindex
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Index misses (absent chunk, keyword or property) are not errors; they are
//! empty result sets.

use crate::types::{ChunkKey, ObjectTypeId};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for kwindex operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by an external collaborator (object cache, chunk cache)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CollaboratorError {
    message: String,
}

impl CollaboratorError {
    /// Create a collaborator error with a message
    pub fn new(message: impl Into<String>) -> Self {
        CollaboratorError {
            message: message.into(),
        }
    }

    /// The collaborator's message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error types for kwindex
#[derive(Debug, Error)]
pub enum Error {
    /// The request names an object type the object cache does not know
    #[error("Unknown object type: {0}")]
    UnknownObjectType(ObjectTypeId),

    /// Configuration failed validation or could not be loaded
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An encoded chunk could not be decoded
    #[error("Chunk decode error for {chunk_key}: {reason}")]
    ChunkDecode {
        /// Offending chunk
        chunk_key: ChunkKey,
        /// What was wrong with it
        reason: String,
    },

    /// Rows could not be encoded into a chunk
    #[error("Chunk encode error for {chunk_key}: {reason}")]
    ChunkEncode {
        /// Chunk being built
        chunk_key: ChunkKey,
        /// Underlying failure
        reason: String,
    },

    /// The object cache failed to materialize candidates
    #[error("Object fetch failed: {0}")]
    ObjectFetch(#[source] CollaboratorError),

    /// The chunk cache failed to deliver a chunk
    #[error("Chunk fetch failed for {chunk_key}: {source}")]
    ChunkFetch {
        /// Chunk being fetched
        chunk_key: ChunkKey,
        /// Collaborator failure
        source: CollaboratorError,
    },

    /// A collaborator call exceeded its deadline
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Which call timed out
        operation: &'static str,
        /// Configured deadline
        after: Duration,
    },

    /// The worker pool queue is full or the pool has shut down
    #[error("Worker pool queue is full")]
    Backpressure,

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// A worker job ended without producing a result (it panicked)
    #[error("Worker job ended without a result")]
    WorkerLost,
}

impl Error {
    /// Whether this is a decode error on the ingestion path
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Error::ChunkDecode { .. })
    }
}
