//! Chunk building (indexer side)
//!
//! Turns objects into encoded chunks the controller can ingest. Each property
//! value contributes its full keywords and its partial keywords; every keyword
//! lands in the chunk its [`chunk_key`] selects.
//!
//! Output is deterministic: rows are sorted by (keyword, property) and id
//! lists ascend.

use crate::chunk::{encode_chunk, ChunkRow};
use crate::chunk_key::chunk_key;
use crate::tokenizer::{split_full_keywords, split_partial_keywords};
use kwindex_core::{ChunkKey, EncodedChunk, Error, ObjectId, Result, SearchResultObject};
use std::collections::{BTreeMap, BTreeSet};

type ChunkRows = BTreeMap<(String, String), BTreeSet<ObjectId>>;

/// Accumulates postings and encodes them into chunks
#[derive(Debug, Clone)]
pub struct ChunkBuilder {
    bucket_count: u32,
    chunks: BTreeMap<ChunkKey, ChunkRows>,
}

impl ChunkBuilder {
    /// Create a builder for `bucket_count` buckets
    pub fn new(bucket_count: u32) -> Self {
        ChunkBuilder {
            bucket_count,
            chunks: BTreeMap::new(),
        }
    }

    /// Index every property of `object`
    pub fn add_object(&mut self, object: &SearchResultObject) {
        for (property, value) in &object.properties {
            let property = property.to_lowercase();
            let keywords = split_full_keywords(value)
                .into_iter()
                .chain(split_partial_keywords(value));
            for keyword in keywords {
                self.add_keyword(&keyword, &property, object.id);
            }
        }
    }

    /// Post `id` under an already-tokenized `keyword`
    pub fn add_keyword(&mut self, keyword: &str, property: &str, id: ObjectId) {
        let key = chunk_key(keyword, self.bucket_count);
        self.chunks
            .entry(key)
            .or_default()
            .entry((keyword.to_string(), property.to_string()))
            .or_default()
            .insert(id);
    }

    /// Encode one chunk per key
    pub fn build(&self, last_update: &str) -> Result<Vec<EncodedChunk>> {
        self.chunks
            .iter()
            .map(|(&key, rows)| {
                let rows = rows
                    .iter()
                    .map(|((keyword, property), ids)| {
                        Ok((keyword.clone(), property.clone(), ids_json(key, ids)?))
                    })
                    .collect::<Result<Vec<ChunkRow>>>()?;
                encode_chunk(key, &rows, last_update)
            })
            .collect()
    }
}

fn ids_json(chunk_key: ChunkKey, ids: &BTreeSet<ObjectId>) -> Result<String> {
    serde_json::to_string(&ids.iter().collect::<Vec<_>>()).map_err(|e| Error::ChunkEncode {
        chunk_key,
        reason: format!("id list: {}", e),
    })
}
