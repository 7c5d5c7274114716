//! Keyword -> chunk key bucketing
//!
//! xxh3 is seedless and byte-order independent, so the mapping is stable
//! across processes and platforms. The indexer and the controller must use
//! the same bucket count.

use kwindex_core::ChunkKey;
use xxhash_rust::xxh3::xxh3_64;

/// Chunk key for `keyword` given `bucket_count` buckets
///
/// `bucket_count` must be non-zero; configuration validation guarantees it.
pub fn chunk_key(keyword: &str, bucket_count: u32) -> ChunkKey {
    debug_assert!(bucket_count > 0, "bucket_count must be non-zero");
    let bucket = xxh3_64(keyword.as_bytes()) % u64::from(bucket_count.max(1));
    ChunkKey(bucket as u32)
}
