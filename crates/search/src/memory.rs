//! In-memory collaborators
//!
//! Reference implementations of [`ObjectCache`] and [`ChunkCache`] for
//! embedding and tests. Both can be told to fail or (object cache) to stall,
//! which exercises the controller's error and timeout paths.

use kwindex_core::{
    ChunkCache, ChunkKey, CollaboratorError, EncodedChunk, ObjectCache, ObjectId, ObjectTypeId,
    SearchResultObject,
};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

// ============================================================================
// InMemoryObjectCache
// ============================================================================

/// Object cache backed by a hash map
#[derive(Debug, Default)]
pub struct InMemoryObjectCache {
    types: RwLock<FxHashSet<ObjectTypeId>>,
    objects: RwLock<FxHashMap<(ObjectTypeId, ObjectId), SearchResultObject>>,
    failure: RwLock<Option<String>>,
    latency: RwLock<Option<Duration>>,
    fetches: AtomicU64,
}

impl InMemoryObjectCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object type with no objects
    pub fn register_type(&self, object_type_id: ObjectTypeId) {
        self.types.write().insert(object_type_id);
    }

    /// Insert or replace an object; its type is registered too
    pub fn insert(&self, object: SearchResultObject) {
        self.types.write().insert(object.object_type_id);
        self.objects
            .write()
            .insert((object.object_type_id, object.id), object);
    }

    /// Remove an object
    pub fn remove(&self, object_type_id: ObjectTypeId, id: ObjectId) -> Option<SearchResultObject> {
        self.objects.write().remove(&(object_type_id, id))
    }

    /// Make every fetch fail with `message` (`None` restores normal behavior)
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.write() = message.map(String::from);
    }

    /// Delay every fetch by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write() = latency;
    }

    /// Number of `get_objects` calls so far
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl ObjectCache for InMemoryObjectCache {
    fn knows_object_type(&self, object_type_id: ObjectTypeId) -> bool {
        self.types.read().contains(&object_type_id)
    }

    fn get_objects(
        &self,
        object_type_id: ObjectTypeId,
        ids: &[ObjectId],
    ) -> Result<Vec<SearchResultObject>, CollaboratorError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let latency = *self.latency.read();
        if let Some(latency) = latency {
            std::thread::sleep(latency);
        }
        if let Some(message) = self.failure.read().as_ref() {
            return Err(CollaboratorError::new(message.clone()));
        }

        let objects = self.objects.read();
        Ok(ids
            .iter()
            .filter_map(|id| objects.get(&(object_type_id, *id)).cloned())
            .collect())
    }
}

// ============================================================================
// InMemoryChunkCache
// ============================================================================

/// Chunk cache backed by a hash map
#[derive(Debug, Default)]
pub struct InMemoryChunkCache {
    chunks: RwLock<FxHashMap<ChunkKey, EncodedChunk>>,
    failure: RwLock<Option<String>>,
    fetches: AtomicU64,
}

impl InMemoryChunkCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a chunk, returning its key
    pub fn put(&self, chunk: EncodedChunk) -> ChunkKey {
        let key = chunk.chunk_key;
        self.chunks.write().insert(key, chunk);
        key
    }

    /// Insert or replace several chunks, returning their keys
    pub fn put_all(&self, chunks: impl IntoIterator<Item = EncodedChunk>) -> Vec<ChunkKey> {
        chunks.into_iter().map(|c| self.put(c)).collect()
    }

    /// Remove a chunk
    pub fn remove(&self, chunk_key: ChunkKey) -> Option<EncodedChunk> {
        self.chunks.write().remove(&chunk_key)
    }

    /// Make every fetch fail with `message` (`None` restores normal behavior)
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.write() = message.map(String::from);
    }

    /// Number of `encoded_chunk` calls so far
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl ChunkCache for InMemoryChunkCache {
    fn encoded_chunk(
        &self,
        chunk_key: ChunkKey,
    ) -> Result<Option<EncodedChunk>, CollaboratorError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        if let Some(message) = self.failure.read().as_ref() {
            return Err(CollaboratorError::new(message.clone()));
        }
        Ok(self.chunks.read().get(&chunk_key).cloned())
    }
}
