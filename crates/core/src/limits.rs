//! Fixed limits of the keyword index
//!
//! These are part of the external contract: the indexer that produces chunks
//! and the controller that reads them must agree on the bucket count, and
//! callers rely on the candidate ceiling.

/// Hard ceiling on the number of candidates a single search considers.
///
/// Stage 1 never hands more than this many object ids to the object cache.
/// Configuration may lower it but never raise it.
pub const MAX_SEARCH_RESULTS: usize = 50;

/// Default number of chunk buckets keywords are hashed into.
pub const DEFAULT_CHUNK_BUCKET_COUNT: u32 = 8192;
