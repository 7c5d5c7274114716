//! In-memory chunk store
//!
//! This module provides:
//! - ChunkStore: chunk key -> decoded postings
//! - Per-key atomic replacement of whole chunks
//! - Applied-hash tracking so redundant updates are skipped
//! - Mutation counter reported back by ingestion
//!
//! # Atomicity
//!
//! Each entry is an `Arc<ChunkPostings>` that is swapped in a single DashMap
//! insert. Readers clone the `Arc` and keep reading the chunk they got, so a
//! search sees either the old or the new postings of a key, never a mix.

use crate::chunk::ChunkPostings;
use dashmap::DashMap;
use kwindex_core::ChunkKey;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct StoredChunk {
    postings: Arc<ChunkPostings>,
    encoded_hash: String,
}

/// Postings of every chunk currently loaded
///
/// # Thread Safety
///
/// Uses DashMap for concurrent access. Reads never block on writes to other
/// keys; writes to the same key are serialized by the shard lock.
#[derive(Debug, Default)]
pub struct ChunkStore {
    chunks: DashMap<ChunkKey, StoredChunk>,

    /// Incremented on every mutation
    version: AtomicU64,
}

impl ChunkStore {
    /// Create an empty store
    pub fn new() -> Self {
        ChunkStore {
            chunks: DashMap::new(),
            version: AtomicU64::new(0),
        }
    }

    // ========================================================================
    // Query
    // ========================================================================

    /// Postings for `chunk_key`
    ///
    /// `None` means no data for this shard, which callers treat as zero matches.
    pub fn get_postings(&self, chunk_key: ChunkKey) -> Option<Arc<ChunkPostings>> {
        self.chunks
            .get(&chunk_key)
            .map(|entry| Arc::clone(&entry.postings))
    }

    /// Hash of the chunk currently installed for `chunk_key`
    pub fn applied_hash(&self, chunk_key: ChunkKey) -> Option<String> {
        self.chunks
            .get(&chunk_key)
            .map(|entry| entry.encoded_hash.clone())
    }

    /// Number of loaded chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Check if no chunks are loaded
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Keys of every loaded chunk
    pub fn chunk_keys(&self) -> Vec<ChunkKey> {
        self.chunks.iter().map(|entry| *entry.key()).collect()
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Replace the chunk for `chunk_key` wholesale
    ///
    /// Not additive: postings previously stored for the key are dropped.
    pub fn apply_chunk(
        &self,
        chunk_key: ChunkKey,
        postings: ChunkPostings,
        encoded_hash: impl Into<String>,
    ) {
        self.chunks.insert(
            chunk_key,
            StoredChunk {
                postings: Arc::new(postings),
                encoded_hash: encoded_hash.into(),
            },
        );
        self.version.fetch_add(1, Ordering::Release);
    }

    /// Drop the chunk for `chunk_key`
    ///
    /// Returns true if a chunk was loaded.
    pub fn remove_chunk(&self, chunk_key: ChunkKey) -> bool {
        let removed = self.chunks.remove(&chunk_key).is_some();
        if removed {
            self.version.fetch_add(1, Ordering::Release);
        }
        removed
    }

    /// Drop every chunk
    pub fn clear(&self) {
        self.chunks.clear();
        self.version.fetch_add(1, Ordering::Release);
    }

    // ========================================================================
    // Version
    // ========================================================================

    /// Mutation counter; bumped by every apply, remove and clear
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

// ============================================================================
// Tests
// ============================================================================
