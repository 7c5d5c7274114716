//! Shared fixtures for kwindex-search integration tests

#![allow(dead_code)]

use kwindex_core::{
    ChunkKey, EncodedChunk, KeywordSearchRequest, ObjectId, ObjectTypeId, SearchResultObject,
};
use kwindex_search::{
    ChunkBuilder, InMemoryChunkCache, InMemoryObjectCache, KeywordIndexController, SearchConfig,
};
use std::sync::Arc;

/// Small bucket count so fixtures exercise keyword collisions
pub const BUCKETS: u32 = 64;

/// Object type used by most fixtures
pub const PARTS: ObjectTypeId = ObjectTypeId(1);

pub fn test_config() -> SearchConfig {
    SearchConfig {
        chunk_bucket_count: BUCKETS,
        ..SearchConfig::default()
    }
}

/// Controller plus the in-memory collaborators behind it
pub struct Fixture {
    pub objects: Arc<InMemoryObjectCache>,
    pub chunks: Arc<InMemoryChunkCache>,
    pub controller: KeywordIndexController,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: SearchConfig) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let objects = Arc::new(InMemoryObjectCache::new());
        let chunks = Arc::new(InMemoryChunkCache::new());
        objects.register_type(PARTS);
        let controller = KeywordIndexController::new(config, objects.clone(), chunks.clone())
            .expect("controller");
        Fixture {
            objects,
            chunks,
            controller,
        }
    }

    /// Register `objects` with the object cache and publish their chunks
    pub fn publish_objects(&self, objects: &[SearchResultObject], version: &str) -> Vec<ChunkKey> {
        let mut builder = ChunkBuilder::new(self.controller.config().chunk_bucket_count);
        for object in objects {
            builder.add_object(object);
            self.objects.insert(object.clone());
        }
        self.chunks.put_all(builder.build(version).expect("build chunks"))
    }

    /// Publish raw `(property, keyword, ids)` rows
    pub fn publish_rows(&self, rows: &[(&str, &str, Vec<i64>)], version: &str) -> Vec<ChunkKey> {
        let chunks = build_rows(self.controller.config().chunk_bucket_count, rows, version);
        self.chunks.put_all(chunks)
    }

    pub async fn index_objects(&self, objects: &[SearchResultObject]) {
        let keys = self.publish_objects(objects, "v1");
        self.controller.notify_of_update(&keys).await.expect("ingest");
    }

    pub async fn index_rows(&self, rows: &[(&str, &str, Vec<i64>)]) {
        let keys = self.publish_rows(rows, "v1");
        self.controller.notify_of_update(&keys).await.expect("ingest");
    }

    pub async fn search_ids(&self, query: &str) -> Vec<i64> {
        let found = self
            .controller
            .search(&KeywordSearchRequest::new(query, PARTS))
            .await
            .expect("search");
        ids_of(&found)
    }

    pub async fn candidates(&self, query: &str) -> Vec<i64> {
        self.controller
            .candidate_ids(&KeywordSearchRequest::new(query, PARTS))
            .await
            .expect("candidates")
            .into_iter()
            .map(|id| id.0)
            .collect()
    }
}

pub fn build_rows(
    bucket_count: u32,
    rows: &[(&str, &str, Vec<i64>)],
    version: &str,
) -> Vec<EncodedChunk> {
    let mut builder = ChunkBuilder::new(bucket_count);
    for (property, keyword, ids) in rows {
        for &id in ids {
            builder.add_keyword(keyword, property, ObjectId(id));
        }
    }
    builder.build(version).expect("build chunks")
}

pub fn part(id: i64, name: &str) -> SearchResultObject {
    SearchResultObject::new(id, PARTS).with_property("name", name)
}

pub fn ids_of(objects: &[SearchResultObject]) -> Vec<i64> {
    objects.iter().map(|o| o.id.0).collect()
}
