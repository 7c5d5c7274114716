//! Keyword autocomplete controller
//!
//! This module provides:
//! - KeywordIndexController: two-stage search over the chunk store
//! - Chunk ingestion from the chunk cache (`notify_of_update`)
//! - CancelToken for cooperative cancellation between stages
//!
//! # Search pipeline
//!
//! ```text
//! KeywordSearchRequest
//!      │
//!      ▼
//! ┌────────────────────────── worker pool ──────────────────────────┐
//! │ stage 1: full + partial tokens → postings → merge → intersect   │
//! └──────────────────────────────┬──────────────────────────────────┘
//!                                │ ≤ result_limit candidate ids
//!                                ▼
//!                 object cache (spawn_blocking + timeout)
//!                                │
//! ┌──────────────────────────────┴─────────── worker pool ──────────┐
//! │ stage 2: keep objects sharing a partial token with the query    │
//! └──────────────────────────────┬──────────────────────────────────┘
//!                                ▼
//!                      Vec<SearchResultObject>
//! ```
//!
//! Search never mutates the store; ingestion is the only writer and is
//! serialized. Chunks are replaced atomically per key.

use crate::background::{JobPriority, PoolStats, WorkerPool};
use crate::chunk::{decode_chunk, ChunkPostings};
use crate::chunk_key::chunk_key;
use crate::config::{DecodeFailurePolicy, SearchConfig};
use crate::merge::{intersect_keyword_results, merge_partial_and_full, KeywordResults};
use crate::store::ChunkStore;
use crate::tokenizer::{is_full_keyword, split_full_keywords, split_partial_keywords};
use kwindex_core::{
    ChunkCache, ChunkKey, CollaboratorError, EncodedChunk, Error, KeywordSearchRequest,
    ObjectCache, ObjectId, ObjectTypeId, Result, SearchResultObject,
};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

// ============================================================================
// CancelToken
// ============================================================================

/// Cooperative cancellation flag for an in-flight search
///
/// Checked between stages; a stage that has started runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// IngestReport
// ============================================================================

/// Outcome of one `notify_of_update` batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Chunks decoded and installed
    pub applied: Vec<ChunkKey>,
    /// Chunks whose hash matched the installed one (or absent and not loaded)
    pub unchanged: Vec<ChunkKey>,
    /// Chunks the cache no longer has; dropped from the store
    pub removed: Vec<ChunkKey>,
    /// Chunks that failed to decode and were skipped, with the reason
    pub failed: Vec<(ChunkKey, String)>,
    /// Store version once the batch finished
    pub store_version: u64,
}

impl IngestReport {
    /// Whether every chunk in the batch was processed without a decode failure
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

// ============================================================================
// KeywordIndexController
// ============================================================================

/// Answers autocomplete queries from the sharded keyword index
///
/// Owns its [`ChunkStore`] (or shares one handed to [`with_store`](Self::with_store))
/// and a worker pool. Async methods must run inside a Tokio runtime.
pub struct KeywordIndexController {
    config: SearchConfig,
    store: Arc<ChunkStore>,
    pool: WorkerPool,
    object_cache: Arc<dyn ObjectCache>,
    chunk_cache: Arc<dyn ChunkCache>,
    ingest_lock: tokio::sync::Mutex<()>,
}

impl KeywordIndexController {
    /// Create a controller with an empty store
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` if the config fails validation or the worker
    /// threads cannot be spawned.
    pub fn new(
        config: SearchConfig,
        object_cache: Arc<dyn ObjectCache>,
        chunk_cache: Arc<dyn ChunkCache>,
    ) -> Result<Self> {
        Self::with_store(config, Arc::new(ChunkStore::new()), object_cache, chunk_cache)
    }

    /// Create a controller over an existing store
    pub fn with_store(
        config: SearchConfig,
        store: Arc<ChunkStore>,
        object_cache: Arc<dyn ObjectCache>,
        chunk_cache: Arc<dyn ChunkCache>,
    ) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.worker_threads, config.max_queue_depth)
            .map_err(|e| Error::InvalidConfig(format!("Failed to spawn worker threads: {}", e)))?;

        Ok(KeywordIndexController {
            config,
            store,
            pool,
            object_cache,
            chunk_cache,
            ingest_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The chunk store this controller reads
    pub fn store(&self) -> &Arc<ChunkStore> {
        &self.store
    }

    /// Worker pool metrics
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Search for objects matching `request`
    ///
    /// At most `result_limit` (≤ 50) candidates are materialized; the result
    /// is the subset that survives verification, in ascending id order.
    ///
    /// # Errors
    ///
    /// - `UnknownObjectType` for a type the object cache does not know
    /// - `ObjectFetch` / `Timeout` if materialization fails; no partial result
    /// - `Backpressure` if the worker pool is saturated or shut down
    pub async fn search(&self, request: &KeywordSearchRequest) -> Result<Vec<SearchResultObject>> {
        self.search_with_cancel(request, &CancelToken::new()).await
    }

    /// [`search`](Self::search) with a cancellation token checked between stages
    pub async fn search_with_cancel(
        &self,
        request: &KeywordSearchRequest,
        cancel: &CancelToken,
    ) -> Result<Vec<SearchResultObject>> {
        let start = Instant::now();
        cancel.check()?;

        let candidates = self.candidate_ids(request).await?;
        if candidates.is_empty() {
            debug!(query = %request.search_string, "no candidates");
            return Ok(Vec::new());
        }
        cancel.check()?;

        let objects = self
            .fetch_objects(request.object_type_id, candidates.clone())
            .await?;
        let fetched = objects.len();
        cancel.check()?;

        let search_string = request.search_string.clone();
        let property = scoped_property(request);
        let object_type_id = request.object_type_id;
        let results = self
            .pool
            .run(JobPriority::Search, move || {
                verify_objects(
                    objects,
                    &candidates,
                    object_type_id,
                    &search_string,
                    property.as_deref(),
                )
            })
            .await?;

        debug!(
            query = %request.search_string,
            fetched,
            returned = results.len(),
            elapsed_micros = start.elapsed().as_micros() as u64,
            "search complete"
        );
        Ok(results)
    }

    /// Stage 1 only: the candidate ids for `request`, ascending, capped
    ///
    /// Does not touch the object cache.
    pub async fn candidate_ids(&self, request: &KeywordSearchRequest) -> Result<Vec<ObjectId>> {
        if !self.object_cache.knows_object_type(request.object_type_id) {
            return Err(Error::UnknownObjectType(request.object_type_id));
        }

        let store = Arc::clone(&self.store);
        let search_string = request.search_string.clone();
        let property = scoped_property(request);
        let bucket_count = self.config.chunk_bucket_count;
        let limit = self.config.result_limit;

        self.pool
            .run(JobPriority::Search, move || {
                find_candidates(
                    &store,
                    &search_string,
                    property.as_deref(),
                    bucket_count,
                    limit,
                )
            })
            .await
    }

    async fn fetch_objects(
        &self,
        object_type_id: ObjectTypeId,
        ids: Vec<ObjectId>,
    ) -> Result<Vec<SearchResultObject>> {
        let cache = Arc::clone(&self.object_cache);
        call_collaborator("object fetch", self.config.object_fetch_timeout(), move || {
            cache.get_objects(object_type_id, &ids)
        })
        .await?
        .map_err(Error::ObjectFetch)
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Reload `chunk_keys` from the chunk cache
    ///
    /// Batches are serialized. Each key is fetched, decoded off the async
    /// thread and swapped into the store atomically. Redundant notifications
    /// (same hash) are no-ops.
    ///
    /// # Errors
    ///
    /// - `ChunkFetch` / `Timeout` if the chunk cache fails; earlier keys stay applied
    /// - `ChunkDecode` under `DecodeFailurePolicy::Fail`
    pub async fn notify_of_update(&self, chunk_keys: &[ChunkKey]) -> Result<IngestReport> {
        let _serialized = self.ingest_lock.lock().await;
        let mut report = IngestReport::default();

        for &chunk_key in chunk_keys {
            let Some(encoded) = self.fetch_chunk(chunk_key).await? else {
                if self.store.remove_chunk(chunk_key) {
                    report.removed.push(chunk_key);
                } else {
                    report.unchanged.push(chunk_key);
                }
                continue;
            };

            if !encoded.encoded_hash.is_empty()
                && self.store.applied_hash(chunk_key).as_deref() == Some(encoded.encoded_hash.as_str())
            {
                report.unchanged.push(chunk_key);
                continue;
            }

            let decoded = self
                .pool
                .run(JobPriority::Ingest, move || decode_for_key(chunk_key, encoded))
                .await?;

            match decoded {
                Ok((postings, hash)) => {
                    self.store.apply_chunk(chunk_key, postings, hash);
                    report.applied.push(chunk_key);
                }
                Err(e) => match self.config.decode_failure_policy {
                    DecodeFailurePolicy::Skip => {
                        warn!(chunk_key = %chunk_key, error = %e, "skipping undecodable chunk");
                        report.failed.push((chunk_key, e.to_string()));
                    }
                    DecodeFailurePolicy::Fail => return Err(e),
                },
            }
        }

        report.store_version = self.store.version();
        info!(
            applied = report.applied.len(),
            unchanged = report.unchanged.len(),
            removed = report.removed.len(),
            failed = report.failed.len(),
            chunks_loaded = self.store.len(),
            store_version = report.store_version,
            "chunk update applied"
        );
        Ok(report)
    }

    async fn fetch_chunk(&self, chunk_key: ChunkKey) -> Result<Option<EncodedChunk>> {
        let cache = Arc::clone(&self.chunk_cache);
        call_collaborator("chunk fetch", self.config.chunk_fetch_timeout(), move || {
            cache.encoded_chunk(chunk_key)
        })
        .await?
        .map_err(|source| Error::ChunkFetch { chunk_key, source })
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Drop all postings and stop the worker pool
    ///
    /// Subsequent searches fail with `Error::Backpressure`.
    pub fn shutdown(&self) {
        self.store.clear();
        self.pool.shutdown();
        info!("keyword index controller shut down");
    }
}

/// Property scope of `request`; indexed property names are lowercase
fn scoped_property(request: &KeywordSearchRequest) -> Option<String> {
    request.property_name.as_deref().map(str::to_lowercase)
}

/// Run a blocking collaborator call with a deadline
async fn call_collaborator<T, F>(
    operation: &'static str,
    timeout: Duration,
    f: F,
) -> Result<std::result::Result<T, CollaboratorError>>
where
    T: Send + 'static,
    F: FnOnce() -> std::result::Result<T, CollaboratorError> + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(f);
    match tokio::time::timeout(timeout, handle).await {
        Err(_) => Err(Error::Timeout {
            operation,
            after: timeout,
        }),
        Ok(Err(_)) => Err(Error::WorkerLost),
        Ok(Ok(result)) => Ok(result),
    }
}

fn decode_for_key(
    chunk_key: ChunkKey,
    encoded: EncodedChunk,
) -> Result<(ChunkPostings, String)> {
    if encoded.chunk_key != chunk_key {
        return Err(Error::ChunkDecode {
            chunk_key,
            reason: format!("cache returned chunk for {}", encoded.chunk_key),
        });
    }
    let postings = decode_chunk(&encoded)?;
    Ok((postings, encoded.encoded_hash))
}

// ============================================================================
// Stage 1: candidate retrieval
// ============================================================================

/// Postings of every chunk a token set touches, read once per key
type ChunkSnapshot = FxHashMap<ChunkKey, Arc<ChunkPostings>>;

fn snapshot_chunks<'a>(
    store: &ChunkStore,
    tokens: impl IntoIterator<Item = &'a String>,
    bucket_count: u32,
) -> ChunkSnapshot {
    let mut snapshot = ChunkSnapshot::default();
    for token in tokens {
        let key = chunk_key(token, bucket_count);
        if snapshot.contains_key(&key) {
            continue;
        }
        if let Some(postings) = store.get_postings(key) {
            snapshot.insert(key, postings);
        }
    }
    snapshot
}

/// Ids posted for each token; tokens without hits are dropped
fn lookup_tokens(
    snapshot: &ChunkSnapshot,
    tokens: &BTreeSet<String>,
    property: Option<&str>,
    bucket_count: u32,
) -> KeywordResults {
    let mut results = KeywordResults::new();
    for token in tokens {
        let Some(postings) = snapshot.get(&chunk_key(token, bucket_count)) else {
            continue;
        };
        let ids = postings.lookup(token, property);
        if !ids.is_empty() {
            results.insert(token.clone(), ids);
        }
    }
    results
}

/// Candidate ids for `search_string`: ascending, at most `limit`
pub(crate) fn find_candidates(
    store: &ChunkStore,
    search_string: &str,
    property: Option<&str>,
    bucket_count: u32,
    limit: usize,
) -> Vec<ObjectId> {
    let full_tokens = split_full_keywords(search_string);
    let partial_tokens = split_partial_keywords(search_string);

    // Full and partial lookups must see the same generation of a shared chunk
    let snapshot = snapshot_chunks(
        store,
        full_tokens.iter().chain(partial_tokens.iter()),
        bucket_count,
    );
    let results_by_full_kw = lookup_tokens(&snapshot, &full_tokens, property, bucket_count);
    let results_by_partial_kw = lookup_tokens(&snapshot, &partial_tokens, property, bucket_count);

    let merged = merge_partial_and_full(search_string, &results_by_full_kw, &results_by_partial_kw);
    let candidates: Vec<ObjectId> = intersect_keyword_results(&merged)
        .into_iter()
        .take(limit)
        .collect();

    debug!(
        full_tokens = full_tokens.len(),
        full_hits = results_by_full_kw.len(),
        partial_tokens = partial_tokens.len(),
        partial_hits = results_by_partial_kw.len(),
        chunks = snapshot.len(),
        keywords = merged.len(),
        candidates = candidates.len(),
        "stage 1 complete"
    );
    candidates
}

// ============================================================================
// Stage 2: verification
// ============================================================================

/// Keep candidate objects that share a partial token with the query
///
/// The query is tokenized without property scoping; only the object side is
/// restricted to `property`. Objects that were not candidates, or belong to
/// another type, are dropped. Output follows candidate order.
pub(crate) fn verify_objects(
    objects: Vec<SearchResultObject>,
    candidates: &[ObjectId],
    object_type_id: ObjectTypeId,
    search_string: &str,
    property: Option<&str>,
) -> Vec<SearchResultObject> {
    let query_tokens: BTreeSet<String> = split_partial_keywords(search_string)
        .into_iter()
        .filter(|t| !is_full_keyword(t))
        .collect();

    let position: FxHashMap<ObjectId, usize> = candidates
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i))
        .collect();

    let mut kept: Vec<(usize, SearchResultObject)> = objects
        .into_iter()
        .filter(|obj| obj.object_type_id == object_type_id)
        .filter_map(|obj| position.get(&obj.id).map(|&pos| (pos, obj)))
        .filter(|(_, obj)| object_matches(obj, &query_tokens, property))
        .collect();

    kept.sort_by_key(|(pos, _)| *pos);
    kept.dedup_by_key(|(pos, _)| *pos);
    kept.into_iter().map(|(_, obj)| obj).collect()
}

fn object_matches(
    object: &SearchResultObject,
    query_tokens: &BTreeSet<String>,
    property: Option<&str>,
) -> bool {
    object
        .properties
        .iter()
        .filter(|(name, _)| property.map_or(true, |p| name.to_lowercase() == p))
        .any(|(_, value)| {
            split_partial_keywords(value)
                .iter()
                .any(|token| query_tokens.contains(token))
        })
}
