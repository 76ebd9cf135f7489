//! Query orchestration: embed, filtered similarity search, article-aware
//! re-ranking with a bounded full-scan fallback.

use std::sync::Arc;

use tracing::{debug, warn};

use super::article::ArticleDetector;
use crate::embeddings::EmbeddingProvider;
use crate::stores::{RegulationFilter, ScoredChunk, VectorStore};
use crate::types::RagError;

/// Smallest accepted `k`.
pub const MIN_RESULTS: usize = 1;
/// Largest accepted `k`.
pub const MAX_RESULTS: usize = 20;

/// Tunable ranking constants. These are policy, not derived values.
#[derive(Clone, Copy, Debug)]
pub struct RankingPolicy {
    /// Additive score boost for chunks matching an explicitly named article.
    pub article_boost: f32,
    /// Fixed relevance assigned to fallback-scan hits.
    pub fallback_score: f32,
    /// Upper bound on chunks enumerated by the fallback scan.
    pub scan_limit: usize,
    /// Scores are clamped to this ceiling after boosting.
    pub max_score: f32,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            article_boost: 0.3,
            fallback_score: 0.9,
            scan_limit: 100,
            max_score: 1.0,
        }
    }
}

/// The retrieval and ranking core.
///
/// Holds explicitly injected gateway handles so tests can substitute fakes;
/// there is no process-global client state.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    detector: ArticleDetector,
    policy: RankingPolicy,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            store,
            embedder,
            detector: ArticleDetector::new(),
            policy: RankingPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RankingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RankingPolicy {
        self.policy
    }

    /// Searches for up to `k` chunks relevant to `query`, restricted to the
    /// given regulation codes (empty slice = search everything).
    ///
    /// Gateway failures are logged and collapse to an empty result list; the
    /// only error callers see is [`RagError::InvalidQuery`] for `k` outside
    /// `[MIN_RESULTS, MAX_RESULTS]`. Use [`Retriever::try_search`] to
    /// distinguish "no matches" from "store unavailable".
    pub async fn search(
        &self,
        query: &str,
        regulations: &[String],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, RagError> {
        match self.try_search(query, regulations, k).await {
            Ok(results) => Ok(results),
            Err(err @ RagError::InvalidQuery(_)) => Err(err),
            Err(err) => {
                warn!(error = %err, "similarity search failed; returning empty result set");
                Ok(Vec::new())
            }
        }
    }

    /// Same pipeline as [`Retriever::search`] but surfaces gateway failures
    /// as typed errors instead of an empty list.
    pub async fn try_search(
        &self,
        query: &str,
        regulations: &[String],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, RagError> {
        if !(MIN_RESULTS..=MAX_RESULTS).contains(&k) {
            return Err(RagError::InvalidQuery(format!(
                "k must be between {MIN_RESULTS} and {MAX_RESULTS}, got {k}"
            )));
        }

        let article_no = self.detector.detect(query);

        let vectors = self.embedder.embed_batch(&[query.to_string()]).await?;
        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("provider returned an empty batch".to_string()))?;

        let filter = RegulationFilter::new(regulations);
        let mut results = self.store.query(&vector, &filter, k).await?;
        debug!(
            candidates = results.len(),
            article = ?article_no,
            "similarity query complete"
        );

        if let Some(article_no) = article_no {
            results = self.prioritize_article(results, article_no).await;
        }

        results.truncate(k);
        Ok(results)
    }

    /// Moves chunks of the requested article to the front with a boosted
    /// score; falls back to a bounded exhaustive scan when the article is
    /// absent from the similarity candidates.
    async fn prioritize_article(
        &self,
        chunks: Vec<ScoredChunk>,
        article_no: u32,
    ) -> Vec<ScoredChunk> {
        let (mut matching, non_matching): (Vec<_>, Vec<_>) = chunks
            .into_iter()
            .partition(|chunk| chunk.payload.article_no == Some(article_no));

        if !matching.is_empty() {
            for chunk in &mut matching {
                chunk.score = (chunk.score + self.policy.article_boost).min(self.policy.max_score);
            }
            // Stable partition: matching chunks first, both groups keeping
            // their similarity order.
            matching.extend(non_matching);
            return matching;
        }

        // The named article is outside the top-k; surface it from a bounded
        // scan with a fixed high score instead of dropping the request.
        let mut chunks = non_matching;
        match self.store.scroll(self.policy.scan_limit).await {
            Ok(stored) => {
                for payload in stored {
                    if payload.article_no == Some(article_no) {
                        chunks.insert(
                            0,
                            ScoredChunk {
                                payload,
                                score: self.policy.fallback_score,
                            },
                        );
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, article_no, "article fallback scan failed");
            }
        }
        chunks
    }
}
