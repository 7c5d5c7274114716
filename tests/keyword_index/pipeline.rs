//! Full pipeline: build chunks, ingest, search, update, search again

use super::*;
use kwindex::{ChunkKey, Error, KeywordSearchRequest};

fn plant() -> Vec<SearchResultObject> {
    vec![
        equipment(101, "Feed Pump A", "North Plant"),
        equipment(102, "Feed Pump B", "North Plant"),
        equipment(103, "Booster Pump", "South Plant"),
        equipment(104, "Inlet Valve", "North Plant"),
        equipment(105, "Pumphouse Crane", "Harbor"),
    ]
}

fn ids(found: &[SearchResultObject]) -> Vec<i64> {
    found.iter().map(|o| o.id.0).collect()
}

#[tokio::test]
async fn prefix_query_finds_partial_words() {
    let h = Harness::new(SearchConfig::default());
    h.load(&plant(), "2024-06-01").await;

    let found = h
        .controller
        .search(&KeywordSearchRequest::new("pum", EQUIPMENT))
        .await
        .unwrap();
    assert_eq!(ids(&found), vec![101, 102, 103, 105]);
}

#[tokio::test]
async fn multi_word_query_intersects() {
    let h = Harness::new(SearchConfig::default());
    h.load(&plant(), "2024-06-01").await;

    let found = h
        .controller
        .search(&KeywordSearchRequest::new("feed pump", EQUIPMENT))
        .await
        .unwrap();
    assert_eq!(ids(&found), vec![101, 102]);
}

#[tokio::test]
async fn single_letter_token_narrows_without_emptying() {
    let h = Harness::new(SearchConfig::default());
    h.load(&plant(), "2024-06-01").await;

    let narrowed = h
        .controller
        .search(&KeywordSearchRequest::new("feed pump b", EQUIPMENT))
        .await
        .unwrap();
    assert_eq!(ids(&narrowed), vec![102]);

    let ignored = h
        .controller
        .search(&KeywordSearchRequest::new("feed pump z", EQUIPMENT))
        .await
        .unwrap();
    assert_eq!(ids(&ignored), vec![101, 102]);
}

#[tokio::test]
async fn property_scope_limits_matches() {
    let h = Harness::new(SearchConfig::default());
    h.load(&plant(), "2024-06-01").await;

    let by_site = h
        .controller
        .search(&KeywordSearchRequest::new("north", EQUIPMENT).with_property("site"))
        .await
        .unwrap();
    assert_eq!(ids(&by_site), vec![101, 102, 104]);

    let by_name = h
        .controller
        .search(&KeywordSearchRequest::new("north", EQUIPMENT).with_property("name"))
        .await
        .unwrap();
    assert!(by_name.is_empty());
}

#[tokio::test]
async fn republished_chunks_replace_old_postings() {
    let h = Harness::new(SearchConfig::default());
    h.load(&plant(), "2024-06-01").await;

    // Rebuild every chunk without the harbor crane
    let mut builder = ChunkBuilder::new(h.controller.config().chunk_bucket_count);
    for item in plant().iter().filter(|o| o.id.0 != 105) {
        builder.add_object(item);
    }
    let rebuilt = builder.build("2024-06-02").unwrap();
    let mut changed: Vec<ChunkKey> = h.controller.store().chunk_keys();
    for key in &changed {
        h.chunks.remove(*key);
    }
    h.chunks.put_all(rebuilt);
    changed.sort();

    let report = h.controller.notify_of_update(&changed).await.unwrap();
    assert!(!report.removed.is_empty());

    let found = h
        .controller
        .search(&KeywordSearchRequest::new("crane", EQUIPMENT))
        .await
        .unwrap();
    assert!(found.is_empty());
    let pumps = h
        .controller
        .candidate_ids(&KeywordSearchRequest::new("pump", EQUIPMENT))
        .await
        .unwrap();
    assert_eq!(pumps.len(), 3);
}

#[tokio::test]
async fn unknown_type_is_rejected() {
    let h = Harness::new(SearchConfig::default());
    let err = h
        .controller
        .search(&KeywordSearchRequest::new("pump", ObjectTypeId(999)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnknownObjectType(_)));
}
