//! Read path: article-aware retrieval over the vector store.

pub mod article;
pub mod retriever;

pub use article::ArticleDetector;
pub use retriever::{MAX_RESULTS, MIN_RESULTS, RankingPolicy, Retriever};
