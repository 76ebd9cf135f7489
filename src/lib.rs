//! ```text
//! Seed corpora ──┬─► ingestion::Ingestor ──► chunk ──► embed ──► stores::sqlite
//! Scraped HTML ──┘        │
//!                         └─► ingestion::fetch (on-disk page cache)
//!
//! Query ──► retrieval::Retriever ──► embeddings::EmbeddingProvider
//!                 │                        │
//!                 │                        └─► embeddings::CachedEmbeddings
//!                 └─► stores::VectorStore ──► ranked ScoredChunk list
//!                        (article boost + bounded fallback scan)
//! ```
//!
pub mod config;
pub mod embeddings;
pub mod ingestion;
pub mod retrieval;
pub mod stores;
pub mod types;

pub use config::Settings;
pub use embeddings::{CachedEmbeddings, EmbeddingProvider, MockEmbeddingProvider};
pub use ingestion::{ChunkerConfig, Ingestor, RegulationDocument};
pub use retrieval::{ArticleDetector, RankingPolicy, Retriever};
pub use stores::{
    ChunkPayload, ChunkPoint, RegulationFilter, ScoredChunk, SqliteRegulationStore, VectorStore,
};
pub use types::{RagError, Regulation};
