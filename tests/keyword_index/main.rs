//! Keyword Index Test Suite
//!
//! Exercises the crate through its public facade only (`kwindex::*`).
//!
//! ## Running Tests
//!
//! ```bash
//! # Run the whole suite
//! cargo test --test keyword_index
//!
//! # Run one module
//! cargo test --test keyword_index pipeline::
//!
//! # Run with log output
//! RUST_LOG=debug cargo test --test keyword_index -- --nocapture
//! ```

use kwindex::{
    ChunkBuilder, InMemoryChunkCache, InMemoryObjectCache, KeywordIndexController, ObjectTypeId,
    SearchConfig, SearchResultObject,
};
use std::sync::Arc;

mod config_file;
mod pipeline;

/// Equipment type used throughout the suite
pub const EQUIPMENT: ObjectTypeId = ObjectTypeId(10);

/// Install a test-friendly tracing subscriber once
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A controller wired to in-memory collaborators
pub struct Harness {
    pub objects: Arc<InMemoryObjectCache>,
    pub chunks: Arc<InMemoryChunkCache>,
    pub controller: KeywordIndexController,
}

impl Harness {
    pub fn new(config: SearchConfig) -> Self {
        init_tracing();
        let objects = Arc::new(InMemoryObjectCache::new());
        let chunks = Arc::new(InMemoryChunkCache::new());
        objects.register_type(EQUIPMENT);
        let controller = KeywordIndexController::new(config, objects.clone(), chunks.clone())
            .expect("Failed to create controller");
        Harness {
            objects,
            chunks,
            controller,
        }
    }

    /// Index `items` and load the resulting chunks
    pub async fn load(&self, items: &[SearchResultObject], version: &str) {
        let mut builder = ChunkBuilder::new(self.controller.config().chunk_bucket_count);
        for item in items {
            builder.add_object(item);
            self.objects.insert(item.clone());
        }
        let keys = self
            .chunks
            .put_all(builder.build(version).expect("Failed to build chunks"));
        let report = self
            .controller
            .notify_of_update(&keys)
            .await
            .expect("Failed to ingest chunks");
        assert!(report.is_clean());
    }
}

pub fn equipment(id: i64, name: &str, site: &str) -> SearchResultObject {
    SearchResultObject::new(id, EQUIPMENT)
        .with_property("name", name)
        .with_property("site", site)
}
