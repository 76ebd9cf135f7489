//! Turning regulation text into stored, embedded chunks.
//!
//! The path from raw source to queryable point:
//!
//! ```text
//!   fetch (cached HTTP)  ->  scrape (HTML -> text)  ->  chunk  ->  embed  ->  upsert
//! ```
//!
//! [`Ingestor`] drives the whole path; the lower modules are usable on
//! their own when only one stage is needed.

pub mod chunk;
pub mod corpus;
pub mod fetch;
pub mod pipeline;
pub mod scrape;

pub use chunk::{
    ChunkerConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, chunk_point_id, chunk_text,
};
pub use corpus::seed_documents;
pub use fetch::{DocumentCache, FetchedPage, fetch_page, http_client};
pub use pipeline::{BatchReport, Ingestor, RegulationDocument};
pub use scrape::{ScrapedArticle, clean_regulation_text, scrape_gdpr_article, scrape_generic};
