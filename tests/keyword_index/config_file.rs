//! Controllers configured from `kwindex.toml`

use super::*;
use kwindex::{DecodeFailurePolicy, EncodedChunk, KeywordSearchRequest, CONFIG_FILE_NAME};
use tempfile::TempDir;

#[tokio::test]
async fn controller_honors_file_result_limit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "result_limit = 3\nchunk_bucket_count = 128\n").unwrap();

    let config = SearchConfig::from_file(&path).unwrap();
    let h = Harness::new(config);
    let items: Vec<_> = (1..=10)
        .map(|i| equipment(i, "Transfer Pump", "Depot"))
        .collect();
    h.load(&items, "v1").await;

    let found = h
        .controller
        .search(&KeywordSearchRequest::new("transfer", EQUIPMENT))
        .await
        .unwrap();
    assert_eq!(found.len(), 3);
    assert_eq!(found[0].id.0, 1);
}

#[tokio::test]
async fn default_file_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    SearchConfig::write_default_if_missing(&path).unwrap();
    let config = SearchConfig::from_file(&path).unwrap();
    assert_eq!(config, SearchConfig::default());

    let h = Harness::new(config);
    h.load(&[equipment(1, "Crane", "Harbor")], "v1").await;
    let found = h
        .controller
        .search(&KeywordSearchRequest::new("crane", EQUIPMENT))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn fail_policy_from_file_surfaces_decode_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "decode_failure_policy = \"fail\"\n").unwrap();

    let config = SearchConfig::from_file(&path).unwrap();
    assert_eq!(config.decode_failure_policy, DecodeFailurePolicy::Fail);

    let h = Harness::new(config);
    let key = h.chunks.put(EncodedChunk {
        chunk_key: kwindex::ChunkKey(7),
        encoded_data: "definitely not zstd".to_string(),
        encoded_hash: String::new(),
        last_update: "v1".to_string(),
    });
    let err = h.controller.notify_of_update(&[key]).await.unwrap_err();
    assert!(err.is_decode_error());
}

#[test]
fn invalid_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "result_limit = 500\n").unwrap();

    let err = SearchConfig::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("result_limit"));
}
