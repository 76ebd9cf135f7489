//! Adapter exposing any rig-core [`EmbeddingModel`] as an [`EmbeddingProvider`].

use async_trait::async_trait;
use rig::embeddings::embedding::EmbeddingModel;

use super::EmbeddingProvider;
use crate::types::RagError;

/// Wraps a rig-core embedding model (OpenAI, Ollama, ...) behind the local
/// gateway trait so the rest of the pipeline stays provider-agnostic.
#[derive(Clone)]
pub struct RigEmbeddingProvider<M> {
    model: M,
    name: String,
}

impl<M> RigEmbeddingProvider<M>
where
    M: EmbeddingModel + Clone + Send + Sync + 'static,
{
    pub fn new(model: M, name: impl Into<String>) -> Self {
        Self {
            model,
            name: name.into(),
        }
    }
}

#[async_trait]
impl<M> EmbeddingProvider for RigEmbeddingProvider<M>
where
    M: EmbeddingModel + Clone + Send + Sync + 'static,
{
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(texts.len());
        // rig models cap the number of documents per request.
        for batch in texts.chunks(M::MAX_DOCUMENTS.max(1)) {
            let embeddings = self
                .model
                .embed_texts(batch.iter().cloned())
                .await
                .map_err(|err| RagError::Embedding(err.to_string()))?;
            for embedding in embeddings {
                vectors.push(embedding.vec.into_iter().map(|v| v as f32).collect());
            }
        }

        if vectors.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "model returned {} vectors for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.model.ndims()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
