//! The write path: chunk, embed and upsert regulation documents.

use std::sync::Arc;

use reqwest::Client;
use tracing::{error, info};
use url::Url;

use super::chunk::{ChunkerConfig, chunk_point_id, chunk_text};
use super::fetch::{DocumentCache, fetch_page};
use super::scrape::{clean_regulation_text, scrape_gdpr_article, scrape_generic};
use crate::embeddings::EmbeddingProvider;
use crate::stores::{ChunkPayload, ChunkPoint, VectorStore};
use crate::types::RagError;

/// A regulation document ready for ingestion.
#[derive(Clone, Debug)]
pub struct RegulationDocument {
    /// Lowercase canonical regulation code.
    pub regulation: String,
    pub content: String,
    pub article_no: Option<u32>,
    pub title: String,
    pub source_url: String,
}

/// Outcome of a multi-document ingestion run.
///
/// Item failures are counted, not propagated; one broken article never
/// aborts the batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub documents_ingested: usize,
    pub chunks_written: usize,
    pub failures: usize,
}

/// Write-path orchestrator with injected gateway handles.
pub struct Ingestor {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: ChunkerConfig,
}

impl Ingestor {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            store,
            embedder,
            chunker: ChunkerConfig::default(),
        }
    }

    #[must_use]
    pub fn with_chunker(mut self, chunker: ChunkerConfig) -> Self {
        self.chunker = chunker;
        self
    }

    /// Chunks, embeds and upserts one document. Returns the number of chunks
    /// written; zero means no content was extracted.
    pub async fn ingest_document(&self, doc: &RegulationDocument) -> Result<usize, RagError> {
        self.store
            .ensure_collection(self.embedder.dimension())
            .await?;

        let chunks = chunk_text(&doc.content, self.chunker);
        if chunks.is_empty() {
            info!(regulation = %doc.regulation, url = %doc.source_url, "no content extracted");
            return Ok(0);
        }

        let vectors = self.embedder.embed_batch(&chunks).await?;
        if vectors.len() != chunks.len() {
            return Err(RagError::Embedding(format!(
                "expected {} vectors, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let regulation = doc.regulation.to_lowercase();
        let points: Vec<ChunkPoint> = chunks
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(chunk_index, (content, vector))| ChunkPoint {
                id: chunk_point_id(&content, &regulation, doc.article_no),
                vector,
                payload: ChunkPayload {
                    content,
                    regulation: regulation.clone(),
                    article_no: doc.article_no,
                    title: doc.title.clone(),
                    source_url: doc.source_url.clone(),
                    chunk_index,
                },
            })
            .collect();

        let written = points.len();
        self.store.upsert(points).await?;
        info!(
            regulation = %regulation,
            article_no = ?doc.article_no,
            chunks = written,
            "ingested document"
        );
        Ok(written)
    }

    /// Ingests every document, tolerating per-item failures.
    pub async fn ingest_batch(&self, docs: &[RegulationDocument]) -> BatchReport {
        let mut report = BatchReport::default();
        for doc in docs {
            match self.ingest_document(doc).await {
                Ok(written) => {
                    report.documents_ingested += 1;
                    report.chunks_written += written;
                }
                Err(err) => {
                    error!(
                        regulation = %doc.regulation,
                        url = %doc.source_url,
                        error = %err,
                        "document ingestion failed; continuing batch"
                    );
                    report.failures += 1;
                }
            }
        }
        report
    }

    /// Fetches and ingests a single source page. gdpr-info.eu pages get the
    /// dedicated scraper; everything else goes through the generic extractor
    /// plus boilerplate cleanup.
    pub async fn ingest_url(
        &self,
        client: &Client,
        regulation: &str,
        url: &Url,
        article_no: Option<u32>,
        cache: Option<&DocumentCache>,
    ) -> Result<usize, RagError> {
        let page = fetch_page(client, url, cache).await?;

        let scraped = if url.host_str() == Some("gdpr-info.eu") {
            scrape_gdpr_article(&page.html, url)?
        } else {
            let mut scraped = scrape_generic(&page.html)?;
            scraped.content = clean_regulation_text(&scraped.content);
            scraped
        };

        let doc = RegulationDocument {
            regulation: regulation.to_lowercase(),
            content: scraped.content,
            article_no: scraped.article_no.or(article_no),
            title: scraped.title,
            source_url: url.to_string(),
        };
        self.ingest_document(&doc).await
    }

    /// Ingests a range of GDPR articles from gdpr-info.eu, one page per
    /// article, tolerating per-article failures.
    pub async fn ingest_gdpr_articles<I>(
        &self,
        client: &Client,
        articles: I,
        cache: Option<&DocumentCache>,
    ) -> BatchReport
    where
        I: IntoIterator<Item = u32>,
    {
        let mut report = BatchReport::default();
        for article_no in articles {
            let raw = format!("https://gdpr-info.eu/art-{article_no}-gdpr/");
            let url = match Url::parse(&raw) {
                Ok(url) => url,
                Err(err) => {
                    error!(article_no, error = %err, "invalid article url");
                    report.failures += 1;
                    continue;
                }
            };
            match self
                .ingest_url(client, "gdpr", &url, Some(article_no), cache)
                .await
            {
                Ok(written) => {
                    report.documents_ingested += 1;
                    report.chunks_written += written;
                }
                Err(err) => {
                    error!(article_no, error = %err, "gdpr article ingestion failed");
                    report.failures += 1;
                }
            }
        }
        report
    }

    /// Ingests the bundled DSA, NIS2 and AI Act digests.
    pub async fn ingest_seed_corpus(&self) -> BatchReport {
        self.ingest_batch(&super::corpus::seed_documents()).await
    }
}
