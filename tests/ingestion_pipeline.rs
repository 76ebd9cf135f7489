//! Write-path integration tests: documents through chunking, embedding and
//! the real SQLite store, plus URL ingestion against a local HTTP mock.

use std::sync::Arc;

use async_trait::async_trait;
use httpmock::prelude::*;
use tempfile::TempDir;
use url::Url;

use lexrag::embeddings::EmbeddingProvider;
use lexrag::ingestion::{
    ChunkerConfig, DocumentCache, Ingestor, RegulationDocument, chunk_point_id, chunk_text,
    http_client,
};
use lexrag::retrieval::Retriever;
use lexrag::stores::{SqliteRegulationStore, VectorStore};
use lexrag::types::RagError;
use lexrag::MockEmbeddingProvider;

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Provider that always fails; exercises batch fault tolerance.
struct BrokenEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for BrokenEmbeddingProvider {
    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Err(RagError::Embedding("provider offline".into()))
    }

    fn dimension(&self) -> usize {
        8
    }

    fn name(&self) -> &str {
        "broken"
    }
}

async fn in_memory_ingestor() -> (Arc<SqliteRegulationStore>, Ingestor) {
    init_tracing();
    let store = Arc::new(SqliteRegulationStore::open_in_memory().await.unwrap());
    let embedder = Arc::new(MockEmbeddingProvider::new());
    let ingestor = Ingestor::new(store.clone(), embedder);
    (store, ingestor)
}

fn doc(regulation: &str, content: &str) -> RegulationDocument {
    RegulationDocument {
        regulation: regulation.to_string(),
        content: content.to_string(),
        article_no: None,
        title: format!("{regulation} test document"),
        source_url: format!("https://example.org/{regulation}"),
    }
}

#[tokio::test]
async fn short_document_becomes_a_single_chunk() {
    let (store, ingestor) = in_memory_ingestor().await;

    let written = ingestor
        .ingest_document(&doc("gdpr", "A short provision about data handling."))
        .await
        .unwrap();

    assert_eq!(written, 1);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn long_document_is_split_into_overlapping_chunks() {
    let (store, ingestor) = in_memory_ingestor().await;
    let ingestor = ingestor.with_chunker(ChunkerConfig {
        chunk_size: 200,
        overlap: 40,
    });

    let content: String = (1..=20)
        .map(|n| format!("Provision {n} requires the operator to notify the authority in scenario {n}. "))
        .collect();
    let written = ingestor.ingest_document(&doc("nis2", &content)).await.unwrap();

    assert!(written > 1);
    assert_eq!(store.count().await.unwrap(), written);
}

#[tokio::test]
async fn chunks_with_identical_id_prefixes_dedupe_in_the_store() {
    let (store, ingestor) = in_memory_ingestor().await;
    let config = ChunkerConfig {
        chunk_size: 200,
        overlap: 40,
    };
    let ingestor = ingestor.with_chunker(config);

    // Chunks of a repetitive document share their regulation, article and
    // leading 100 characters, so several of them map to the same
    // content-addressed id and upsert stores each id once.
    let content = "The competent authority shall notify the operator without undue delay. ".repeat(20);
    let written = ingestor.ingest_document(&doc("nis2", &content)).await.unwrap();

    let distinct_ids: std::collections::HashSet<_> = chunk_text(&content, config)
        .iter()
        .map(|chunk| chunk_point_id(chunk, "nis2", None))
        .collect();
    assert!(distinct_ids.len() < written);
    assert_eq!(store.count().await.unwrap(), distinct_ids.len());
}

#[tokio::test]
async fn reingesting_the_same_document_is_idempotent() {
    let (store, ingestor) = in_memory_ingestor().await;
    let document = doc("dsa", "Providers of intermediary services shall act transparently.");

    ingestor.ingest_document(&document).await.unwrap();
    let first_count = store.count().await.unwrap();
    ingestor.ingest_document(&document).await.unwrap();

    assert_eq!(store.count().await.unwrap(), first_count);
}

#[tokio::test]
async fn empty_document_writes_nothing() {
    let (store, ingestor) = in_memory_ingestor().await;
    let written = ingestor.ingest_document(&doc("gdpr", "   ")).await.unwrap();
    assert_eq!(written, 0);
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn batch_counts_failures_without_aborting() {
    let store = Arc::new(SqliteRegulationStore::open_in_memory().await.unwrap());
    let ingestor = Ingestor::new(store.clone(), Arc::new(BrokenEmbeddingProvider));

    let report = ingestor
        .ingest_batch(&[doc("gdpr", "some text"), doc("dsa", "other text")])
        .await;

    assert_eq!(report.documents_ingested, 0);
    assert_eq!(report.failures, 2);
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn seed_corpus_covers_three_regulations() {
    let (store, ingestor) = in_memory_ingestor().await;

    let report = ingestor.ingest_seed_corpus().await;

    assert_eq!(report.documents_ingested, 3);
    assert_eq!(report.failures, 0);
    assert!(report.chunks_written >= 3);

    let stored = store.scroll(1000).await.unwrap();
    let mut regs: Vec<&str> = stored.iter().map(|p| p.regulation.as_str()).collect();
    regs.sort_unstable();
    regs.dedup();
    assert_eq!(regs, ["ai_act", "dsa", "nis2"]);
}

#[tokio::test]
async fn ingested_seed_corpus_is_searchable() {
    let store = Arc::new(SqliteRegulationStore::open_in_memory().await.unwrap());
    let embedder = Arc::new(MockEmbeddingProvider::new());
    let ingestor = Ingestor::new(store.clone(), embedder.clone());
    ingestor.ingest_seed_corpus().await;

    let retriever = Retriever::new(store, embedder);
    let hits = retriever
        .search("risk management measures", &["nis2".to_string()], 5)
        .await
        .unwrap();

    assert!(!hits.is_empty());
    assert!(hits.iter().all(|h| h.payload.regulation == "nis2"));
}

#[tokio::test]
async fn ingest_url_extracts_page_content_and_caches_it() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/eli/reg/2022/2065/oj");
            then.status(200).body(concat!(
                "<html><head><title>ignored</title></head><body>",
                "<h1>Digital Services Act</h1>",
                "<main><p>Providers of intermediary services shall designate a single point of contact for direct communication with authorities.</p></main>",
                "</body></html>",
            ));
        })
        .await;

    let cache_dir = TempDir::new().unwrap();
    let cache = DocumentCache::new(cache_dir.path());
    let client = http_client("lexrag-test/0").unwrap();
    let url = Url::parse(&server.url("/eli/reg/2022/2065/oj")).unwrap();

    let (store, ingestor) = in_memory_ingestor().await;
    let written = ingestor
        .ingest_url(&client, "dsa", &url, None, Some(&cache))
        .await
        .unwrap();
    assert!(written >= 1);
    let stored = store.scroll(10).await.unwrap();
    assert!(stored[0].content.contains("single point of contact"));
    assert_eq!(stored[0].title, "Digital Services Act");

    // Second run is served from the page cache.
    ingestor
        .ingest_url(&client, "dsa", &url, None, Some(&cache))
        .await
        .unwrap();
    mock.assert_hits_async(1).await;
}
