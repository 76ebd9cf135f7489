//! Embedding gateway: a small provider trait plus adapters.
//!
//! The retrieval and ingestion paths only ever see [`EmbeddingProvider`];
//! production deployments plug in a rig-core model via
//! [`rig::RigEmbeddingProvider`], tests use the deterministic
//! [`MockEmbeddingProvider`].

pub mod cache;
pub mod rig;

use async_trait::async_trait;

use crate::types::RagError;

pub use cache::{CacheStats, CachedEmbeddings};
pub use rig::RigEmbeddingProvider;

/// Converts batches of text into fixed-dimension vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds every input text, preserving order. An empty batch yields an
    /// empty result.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Vector width produced by this provider. Constant per deployment.
    fn dimension(&self) -> usize;

    /// Short identifier used in logs.
    fn name(&self) -> &str;
}

/// Deterministic hash-based provider for tests and offline smoke runs.
///
/// Identical texts always map to identical vectors, distinct texts to
/// distinct vectors with overwhelming probability. The vectors carry no
/// semantic signal.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dimension: 8 }
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }

    fn hash_to_vec(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();
        (0..self.dimension)
            .map(|i| {
                let bits = seed.rotate_left((i % 64) as u32) ^ ((i as u64) << 17);
                (bits as f32) / (u64::MAX as f32)
            })
            .collect()
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        Ok(texts.iter().map(|text| self.hash_to_vec(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "mock"
    }
}
