use super::*;
use crate::QuoteSearchError;
use crate::config::{Config, StoreConfig};
use crate::embeddings::test_support::{FailingEmbedder, KeywordEmbedder, TEST_DIMENSION};
use std::path::PathBuf;
use tempfile::TempDir;

fn create_test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config {
        store: StoreConfig {
            path: temp_dir.path().join("chroma"),
            collection: "quotes".to_string(),
        },
        ..Config::default()
    };
    config.embedding.dimensions = TEST_DIMENSION as u32;
    config
}

fn write_dataset(temp_dir: &TempDir, content: &str) -> PathBuf {
    let path = temp_dir.path().join("quotes.json");
    std::fs::write(&path, content).expect("should write dataset");
    path
}

#[tokio::test]
async fn ingest_single_quote() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = create_test_config(&temp_dir);
    let dataset = write_dataset(
        &temp_dir,
        r#"[{"Quote": "Be yourself.", "Author": "Oscar Wilde", "Category": "wisdom"}]"#,
    );
    let mut collection = QuoteCollection::open_or_create(&config)
        .await
        .expect("should create collection");

    let report = ingest(&dataset, &KeywordEmbedder, &mut collection)
        .await
        .expect("ingest should succeed");

    assert_eq!(
        report,
        IngestReport {
            collection: "quotes".to_string(),
            ingested: 1,
            skipped: 0,
        }
    );
    assert_eq!(
        collection.ids().await.expect("should list ids"),
        vec!["quote_0"]
    );

    let hits = collection
        .query(&KeywordEmbedder::vector("self-acceptance"), 3)
        .await
        .expect("query should succeed");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document, "\"Be yourself.\" — Oscar Wilde");
    assert_eq!(hits[0].metadata.author.as_deref(), Some("Oscar Wilde"));
    assert_eq!(hits[0].metadata.category.as_deref(), Some("wisdom"));
}

#[tokio::test]
async fn ingest_only_invalid_records() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = create_test_config(&temp_dir);
    let dataset = write_dataset(&temp_dir, r#"[{"Quote": 42}]"#);
    let mut collection = QuoteCollection::open_or_create(&config)
        .await
        .expect("should create collection");

    let report = ingest(&dataset, &KeywordEmbedder, &mut collection)
        .await
        .expect("ingest should succeed");

    assert_eq!(report.ingested, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(collection.count().await.expect("should count"), 0);
}

#[tokio::test]
async fn ingest_replaces_previous_snapshot() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = create_test_config(&temp_dir);
    let mut collection = QuoteCollection::open_or_create(&config)
        .await
        .expect("should create collection");

    let first = write_dataset(
        &temp_dir,
        r#"[{"Quote": "One"}, {"Quote": "Two"}, {"Quote": "Three"}]"#,
    );
    ingest(&first, &KeywordEmbedder, &mut collection)
        .await
        .expect("first ingest should succeed");

    let second = write_dataset(&temp_dir, r#"[{"Quote": "Only one now"}]"#);
    ingest(&second, &KeywordEmbedder, &mut collection)
        .await
        .expect("second ingest should succeed");

    assert_eq!(
        collection.ids().await.expect("should list ids"),
        vec!["quote_0"]
    );
}

#[tokio::test]
async fn ingest_missing_dataset_is_fatal() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = create_test_config(&temp_dir);
    let mut collection = QuoteCollection::open_or_create(&config)
        .await
        .expect("should create collection");

    let result = ingest(
        temp_dir.path().join("missing.json"),
        &KeywordEmbedder,
        &mut collection,
    )
    .await;

    assert!(matches!(result, Err(QuoteSearchError::Dataset(_))));
}

#[tokio::test]
async fn provider_failure_keeps_previous_snapshot() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = create_test_config(&temp_dir);
    let dataset = write_dataset(&temp_dir, r#"[{"Quote": "Keep me"}, {"Quote": "Me too"}]"#);
    let mut collection = QuoteCollection::open_or_create(&config)
        .await
        .expect("should create collection");
    ingest(&dataset, &KeywordEmbedder, &mut collection)
        .await
        .expect("ingest should succeed");

    let result = ingest(&dataset, &FailingEmbedder, &mut collection).await;

    assert!(matches!(result, Err(QuoteSearchError::Embedding(_))));
    assert_eq!(collection.count().await.expect("should count"), 2);
}
