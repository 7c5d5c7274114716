//! Encoded chunk codec
//!
//! Transport form of a chunk:
//!
//! ```text
//! encoded_data = base64( zstd( json( [[keyword, property, "[id, ...]"], ...] ) ) )
//! encoded_hash = hex( xxh3_64(encoded_data) )
//! ```
//!
//! Decoding is all-or-nothing: a single malformed row rejects the chunk, so
//! the store never installs a partially decoded shard.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use kwindex_core::{ChunkKey, EncodedChunk, Error, ObjectId, Result};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use xxhash_rust::xxh3::xxh3_64;

/// One decoded row: `(keyword, property name, object ids as JSON)`
pub type ChunkRow = (String, String, String);

/// zstd level used for chunk payloads
const COMPRESSION_LEVEL: i32 = 3;

// ============================================================================
// ChunkPostings
// ============================================================================

/// Decoded postings of one chunk: property name -> keyword -> object ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkPostings {
    by_property: FxHashMap<String, FxHashMap<String, Vec<ObjectId>>>,
}

impl ChunkPostings {
    /// Create empty postings
    pub fn new() -> Self {
        Self::default()
    }

    /// Add ids for `keyword` under `property`
    ///
    /// Repeated rows for the same pair are appended, not replaced.
    pub fn insert(&mut self, property: &str, keyword: &str, ids: Vec<ObjectId>) {
        self.by_property
            .entry(property.to_string())
            .or_default()
            .entry(keyword.to_string())
            .or_default()
            .extend(ids);
    }

    /// Ids posted for `keyword`
    ///
    /// With `property` set only that property is consulted, otherwise the ids
    /// of every property are unioned. A miss yields an empty set.
    pub fn lookup(&self, keyword: &str, property: Option<&str>) -> BTreeSet<ObjectId> {
        match property {
            Some(name) => self
                .by_property
                .get(name)
                .and_then(|keywords| keywords.get(keyword))
                .map(|ids| ids.iter().copied().collect())
                .unwrap_or_default(),
            None => self
                .by_property
                .values()
                .filter_map(|keywords| keywords.get(keyword))
                .flat_map(|ids| ids.iter().copied())
                .collect(),
        }
    }

    /// Number of distinct (property, keyword) pairs
    pub fn len(&self) -> usize {
        self.by_property.values().map(|k| k.len()).sum()
    }

    /// Check if there are no postings
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Hash recorded in `EncodedChunk::encoded_hash`
pub fn content_hash(encoded_data: &str) -> String {
    format!("{:016x}", xxh3_64(encoded_data.as_bytes()))
}

/// Encode rows into a chunk
pub fn encode_chunk(
    chunk_key: ChunkKey,
    rows: &[ChunkRow],
    last_update: impl Into<String>,
) -> Result<EncodedChunk> {
    let encode_err = |reason: String| Error::ChunkEncode { chunk_key, reason };

    let json = serde_json::to_vec(rows).map_err(|e| encode_err(e.to_string()))?;
    let compressed =
        zstd::encode_all(&json[..], COMPRESSION_LEVEL).map_err(|e| encode_err(e.to_string()))?;
    let encoded_data = STANDARD.encode(compressed);
    let encoded_hash = content_hash(&encoded_data);

    Ok(EncodedChunk {
        chunk_key,
        encoded_data,
        encoded_hash,
        last_update: last_update.into(),
    })
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a chunk into postings
///
/// # Errors
///
/// `Error::ChunkDecode` if the hash does not match, the payload is not valid
/// base64/zstd/JSON, or any row's id list is not a JSON array of integers.
pub fn decode_chunk(chunk: &EncodedChunk) -> Result<ChunkPostings> {
    let chunk_key = chunk.chunk_key;
    let decode_err = |reason: String| Error::ChunkDecode { chunk_key, reason };

    if !chunk.encoded_hash.is_empty() && chunk.encoded_hash != content_hash(&chunk.encoded_data) {
        return Err(decode_err(format!(
            "hash mismatch (declared {})",
            chunk.encoded_hash
        )));
    }

    let compressed = STANDARD
        .decode(chunk.encoded_data.as_bytes())
        .map_err(|e| decode_err(format!("invalid base64: {}", e)))?;
    let json = zstd::decode_all(&compressed[..])
        .map_err(|e| decode_err(format!("invalid zstd payload: {}", e)))?;
    let rows: Vec<ChunkRow> = serde_json::from_slice(&json)
        .map_err(|e| decode_err(format!("invalid row array: {}", e)))?;

    let mut postings = ChunkPostings::new();
    for (keyword, property, ids_json) in rows {
        let ids: Vec<ObjectId> = serde_json::from_str(&ids_json).map_err(|e| {
            decode_err(format!(
                "invalid object id list for keyword '{}': {}",
                keyword, e
            ))
        })?;
        postings.insert(&property.to_lowercase(), &keyword, ids);
    }
    Ok(postings)
}
