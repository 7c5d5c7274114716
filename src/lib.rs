//! kwindex - sharded in-memory keyword index for autocomplete search
//!
//! Objects are indexed into chunks keyed by a hash of each keyword. The
//! [`KeywordIndexController`] keeps the decoded chunks in memory, reloads them
//! when notified of updates, and answers partial-word queries in two stages:
//! candidate retrieval from the index, then verification against the live
//! objects.
//!
//! # Quick Start
//!
//! ```ignore
//! use kwindex::{KeywordIndexController, KeywordSearchRequest, ObjectTypeId, SearchConfig};
//!
//! let controller = KeywordIndexController::new(SearchConfig::default(), objects, chunks)?;
//! controller.notify_of_update(&changed_chunk_keys).await?;
//!
//! let hits = controller
//!     .search(&KeywordSearchRequest::new("pump sta", ObjectTypeId(7)))
//!     .await?;
//! ```
//!
//! # Architecture
//!
//! - `kwindex-core`: ids, request/result types, errors, collaborator traits
//! - `kwindex-search`: tokenizer, chunk codec, store, merge rules, controller

// Re-export the public API
pub use kwindex_core::*;
pub use kwindex_search::*;
