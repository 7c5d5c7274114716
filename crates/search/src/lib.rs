//! Sharded in-memory keyword index for autocomplete
//!
//! This crate provides:
//! - Tokenizer for full keywords (`word$`) and partial keywords (3-char fragments)
//! - chunk_key: stable keyword → shard mapping
//! - ChunkStore: per-shard postings with atomic replacement
//! - Chunk encoding/decoding (`base64(zstd(json))` + xxh3 content hash)
//! - Merge and intersection of per-keyword results
//! - KeywordIndexController: two-stage search and chunk ingestion
//! - ChunkBuilder and in-memory collaborators for embedding and tests
//!
//! # Usage
//!
//! ```no_run
//! use kwindex_search::{
//!     ChunkBuilder, InMemoryChunkCache, InMemoryObjectCache, KeywordIndexController,
//!     SearchConfig,
//! };
//! use kwindex_core::{KeywordSearchRequest, ObjectTypeId, SearchResultObject};
//! use std::sync::Arc;
//!
//! # async fn demo() -> kwindex_core::Result<()> {
//! let config = SearchConfig::default();
//! let objects = Arc::new(InMemoryObjectCache::new());
//! let chunks = Arc::new(InMemoryChunkCache::new());
//!
//! let pump = SearchResultObject::new(1, ObjectTypeId(7)).with_property("name", "Pump Station");
//! let mut builder = ChunkBuilder::new(config.chunk_bucket_count);
//! builder.add_object(&pump);
//! objects.insert(pump);
//! let keys = chunks.put_all(builder.build("2024-01-01")?);
//!
//! let controller = KeywordIndexController::new(config, objects, chunks)?;
//! controller.notify_of_update(&keys).await?;
//!
//! let found = controller
//!     .search(&KeywordSearchRequest::new("pump", ObjectTypeId(7)))
//!     .await?;
//! assert_eq!(found.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod background;
pub mod chunk;
pub mod chunk_key;
pub mod config;
pub mod controller;
pub mod indexer;
pub mod memory;
pub mod merge;
pub mod store;
pub mod tokenizer;

// Re-export commonly used types
pub use background::{JobPriority, PoolStats, WorkerPool};
pub use chunk::{decode_chunk, encode_chunk, ChunkPostings, ChunkRow};
pub use chunk_key::chunk_key;
pub use config::{DecodeFailurePolicy, SearchConfig, CONFIG_FILE_NAME};
pub use controller::{CancelToken, IngestReport, KeywordIndexController};
pub use indexer::ChunkBuilder;
pub use memory::{InMemoryChunkCache, InMemoryObjectCache};
pub use merge::{intersect_keyword_results, merge_partial_and_full, IdSet, KeywordResults};
pub use store::ChunkStore;
pub use tokenizer::{split_full_keywords, split_partial_keywords};
