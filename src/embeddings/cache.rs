//! In-process cache for embedding lookups.
//!
//! Re-ingestion and repeated queries tend to embed the same text more than
//! once; the cache avoids paying the provider round-trip twice for it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::EmbeddingProvider;
use crate::types::RagError;

/// Hit/miss counters for a [`CachedEmbeddings`] wrapper.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Wraps any provider with a text-keyed vector cache.
pub struct CachedEmbeddings<P> {
    inner: P,
    cache: RwLock<HashMap<String, Vec<f32>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<P> CachedEmbeddings<P>
where
    P: EmbeddingProvider,
{
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl<P> EmbeddingProvider for CachedEmbeddings<P>
where
    P: EmbeddingProvider,
{
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut resolved: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut missing: Vec<usize> = Vec::new();

        {
            let cache = self.cache.read();
            for (i, text) in texts.iter().enumerate() {
                match cache.get(text) {
                    Some(vector) => resolved[i] = Some(vector.clone()),
                    None => missing.push(i),
                }
            }
        }
        self.hits
            .fetch_add((texts.len() - missing.len()) as u64, Ordering::Relaxed);
        self.misses.fetch_add(missing.len() as u64, Ordering::Relaxed);

        if !missing.is_empty() {
            let pending: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let vectors = self.inner.embed_batch(&pending).await?;
            if vectors.len() != pending.len() {
                return Err(RagError::Embedding(format!(
                    "provider returned {} vectors for {} inputs",
                    vectors.len(),
                    pending.len()
                )));
            }
            let mut cache = self.cache.write();
            for (&i, vector) in missing.iter().zip(vectors) {
                cache.insert(texts[i].clone(), vector.clone());
                resolved[i] = Some(vector);
            }
        }

        Ok(resolved.into_iter().flatten().collect())
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbeddingProvider;

    #[tokio::test]
    async fn repeated_texts_hit_the_cache() {
        let provider = CachedEmbeddings::new(MockEmbeddingProvider::new());
        let batch = vec!["article 17".to_string(), "article 20".to_string()];

        let first = provider.embed_batch(&batch).await.unwrap();
        assert_eq!(provider.stats(), CacheStats { hits: 0, misses: 2 });

        let second = provider.embed_batch(&batch).await.unwrap();
        assert_eq!(provider.stats(), CacheStats { hits: 2, misses: 2 });
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn duplicate_inputs_in_one_batch_resolve_consistently() {
        let provider = CachedEmbeddings::new(MockEmbeddingProvider::new());
        let batch = vec!["same".to_string(), "same".to_string()];
        let vectors = provider.embed_batch(&batch).await.unwrap();
        assert_eq!(vectors[0], vectors[1]);
    }
}
