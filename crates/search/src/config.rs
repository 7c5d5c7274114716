//! Search configuration via `kwindex.toml`
//!
//! Every field has a default, so an empty file is a valid configuration.
//! The values are validated eagerly on load.

use kwindex_core::{Error, Result, DEFAULT_CHUNK_BUCKET_COUNT, MAX_SEARCH_RESULTS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "kwindex.toml";

/// What ingestion does with a chunk that fails to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeFailurePolicy {
    /// Log, keep the previously applied chunk, continue with the batch
    #[default]
    Skip,
    /// Abort the batch with `Error::ChunkDecode`
    Fail,
}

/// Keyword index configuration loaded from `kwindex.toml`.
///
/// # Example
///
/// ```toml
/// result_limit = 50
/// chunk_bucket_count = 8192
/// worker_threads = 2
/// decode_failure_policy = "skip"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum candidates per search, 1..=50.
    pub result_limit: usize,
    /// Number of chunk buckets. Must match the indexer.
    pub chunk_bucket_count: u32,
    /// Worker threads for CPU-bound search and decode work.
    pub worker_threads: usize,
    /// Jobs the worker pool queues before rejecting with backpressure.
    pub max_queue_depth: usize,
    /// Deadline for the object cache, in milliseconds.
    pub object_fetch_timeout_ms: u64,
    /// Deadline for each chunk cache fetch, in milliseconds.
    pub chunk_fetch_timeout_ms: u64,
    /// Handling of undecodable chunks during ingestion.
    pub decode_failure_policy: DecodeFailurePolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_limit: MAX_SEARCH_RESULTS,
            chunk_bucket_count: DEFAULT_CHUNK_BUCKET_COUNT,
            worker_threads: 2,
            max_queue_depth: 4096,
            object_fetch_timeout_ms: 5000,
            chunk_fetch_timeout_ms: 5000,
            decode_failure_policy: DecodeFailurePolicy::Skip,
        }
    }
}

impl SearchConfig {
    /// Object cache deadline.
    pub fn object_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.object_fetch_timeout_ms)
    }

    /// Chunk cache deadline.
    pub fn chunk_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.chunk_fetch_timeout_ms)
    }

    /// Check every field is in range.
    ///
    /// # Errors
    ///
    /// `Error::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.result_limit == 0 || self.result_limit > MAX_SEARCH_RESULTS {
            return Err(Error::InvalidConfig(format!(
                "result_limit must be between 1 and {}, got {}",
                MAX_SEARCH_RESULTS, self.result_limit
            )));
        }
        if self.chunk_bucket_count == 0 {
            return Err(Error::InvalidConfig(
                "chunk_bucket_count must be non-zero".to_string(),
            ));
        }
        if self.worker_threads == 0 {
            return Err(Error::InvalidConfig(
                "worker_threads must be non-zero".to_string(),
            ));
        }
        if self.max_queue_depth == 0 {
            return Err(Error::InvalidConfig(
                "max_queue_depth must be non-zero".to_string(),
            ));
        }
        if self.object_fetch_timeout_ms == 0 || self.chunk_fetch_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "fetch timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# kwindex configuration

# Maximum candidates considered per search (1..=50)
result_limit = 50

# Number of keyword buckets; must match the indexer that builds chunks
chunk_bucket_count = 8192

# Worker threads for tokenizing, intersecting and chunk decoding
worker_threads = 2

# Queued jobs before searches are rejected with backpressure
max_queue_depth = 4096

# Collaborator deadlines in milliseconds
object_fetch_timeout_ms = 5000
chunk_fetch_timeout_ms = 5000

# Undecodable chunks: "skip" (log and keep the old chunk) or "fail" (abort the batch)
decode_failure_policy = "skip"
"#
    }

    /// Parse and validate config text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SearchConfig = toml::from_str(content)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::InvalidConfig(msg) => {
                Error::InvalidConfig(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::InvalidConfig(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}
