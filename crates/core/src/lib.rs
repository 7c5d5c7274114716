//! Core types and traits for kwindex
//!
//! This crate defines the foundational types used throughout the system:
//! - ObjectId / ObjectTypeId: identifiers of searchable objects
//! - ChunkKey: shard identifier of the keyword index
//! - EncodedChunk: a shard as delivered by the chunk cache
//! - SearchResultObject: a materialized object returned by searches
//! - KeywordSearchRequest: the autocomplete query
//! - Error: Error type hierarchy
//! - Traits: external collaborators (ObjectCache, ChunkCache)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limits;
pub mod traits;
pub mod types;

pub use error::{CollaboratorError, Error, Result};
pub use limits::{DEFAULT_CHUNK_BUCKET_COUNT, MAX_SEARCH_RESULTS};
pub use traits::{ChunkCache, ObjectCache};
pub use types::{
    ChunkKey, EncodedChunk, KeywordSearchRequest, ObjectId, ObjectTypeId, SearchResultObject,
};
