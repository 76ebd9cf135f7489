//! Storage gateway for regulation chunks and their embeddings.
//!
//! ```text
//!                  ┌──────────────────┐
//!                  │ VectorStore trait│
//!                  │  (async gateway) │
//!                  └────────┬─────────┘
//!                           │
//!              ┌────────────┴────────────┐
//!              ▼                         ▼
//!       ┌─────────────┐          ┌─────────────┐
//!       │   SQLite    │          │  (future)   │
//!       │ sqlite-vec  │          │   Qdrant    │
//!       └─────────────┘          └─────────────┘
//! ```
//!
//! The trait mirrors the operations the retrieval core depends on: idempotent
//! collection bootstrap, upsert-by-id, filtered nearest-neighbour query, a
//! bounded unordered scroll for fallback scans, bulk delete by regulation,
//! and a health ping.

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::RagError;

pub use sqlite::SqliteRegulationStore;

/// Payload stored alongside each vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub content: String,
    /// Lowercase canonical regulation code.
    pub regulation: String,
    /// `None` when the source document has no article subdivision.
    pub article_no: Option<u32>,
    pub title: String,
    pub source_url: String,
    /// Zero-based position within the parent document.
    pub chunk_index: usize,
}

/// Upsert unit: a content-addressed id, its embedding, and the payload.
#[derive(Clone, Debug)]
pub struct ChunkPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// A retrieved chunk carrying its query-relative similarity score.
#[derive(Clone, Debug, Serialize)]
pub struct ScoredChunk {
    #[serde(flatten)]
    pub payload: ChunkPayload,
    pub score: f32,
}

/// Regulation membership filter for similarity queries.
///
/// Empty means no filter (search everything). A single code is a strict
/// match; multiple codes are OR semantics (match any listed regulation).
/// Codes are normalized to lowercase on construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegulationFilter {
    codes: Vec<String>,
}

impl RegulationFilter {
    /// Filter matching any regulation (no restriction).
    pub fn any() -> Self {
        Self::default()
    }

    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            codes: codes
                .into_iter()
                .map(|code| code.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// Whether a payload's regulation passes the filter.
    pub fn matches(&self, regulation: &str) -> bool {
        self.codes.is_empty() || self.codes.iter().any(|code| code == regulation)
    }
}

/// Async gateway to a vector store backend.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Creates the collection for vectors of the given width if it does not
    /// exist. Safe to call on every ingestion and at process start.
    async fn ensure_collection(&self, dimension: usize) -> Result<(), RagError>;

    /// Inserts points, overwriting any existing point with the same id.
    async fn upsert(&self, points: Vec<ChunkPoint>) -> Result<(), RagError>;

    /// Nearest-neighbour query (cosine similarity), most similar first.
    async fn query(
        &self,
        vector: &[f32],
        filter: &RegulationFilter,
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, RagError>;

    /// Bounded, unordered enumeration of stored payloads. Used by the
    /// article fallback scan; makes no similarity claim.
    async fn scroll(&self, limit: usize) -> Result<Vec<ChunkPayload>, RagError>;

    /// Deletes every chunk of the given regulation, returning the count.
    async fn delete_by_regulation(&self, regulation: &str) -> Result<usize, RagError>;

    /// Cheap reachability check.
    async fn ping(&self) -> bool;
}
