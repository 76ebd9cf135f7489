//! Bundled seed digests for regulations without a dedicated scraper.

use super::pipeline::RegulationDocument;
use crate::types::Regulation;

const DSA_DIGEST: &str = include_str!("../../data/dsa.txt");
const NIS2_DIGEST: &str = include_str!("../../data/nis2.txt");
const AI_ACT_DIGEST: &str = include_str!("../../data/ai_act.txt");

/// The documents ingested by [`crate::ingestion::Ingestor::ingest_seed_corpus`].
///
/// GDPR is absent on purpose: its articles are scraped per-article from
/// gdpr-info.eu, which yields article-level `article_no` metadata the
/// single-document digests cannot carry.
pub fn seed_documents() -> Vec<RegulationDocument> {
    vec![
        RegulationDocument {
            regulation: Regulation::Dsa.code().to_string(),
            content: DSA_DIGEST.trim().to_string(),
            article_no: None,
            title: "Digital Services Act (DSA) - Regulation (EU) 2022/2065".to_string(),
            source_url: "https://eur-lex.europa.eu/eli/reg/2022/2065/oj".to_string(),
        },
        RegulationDocument {
            regulation: Regulation::Nis2.code().to_string(),
            content: NIS2_DIGEST.trim().to_string(),
            article_no: None,
            title: "NIS2 Directive - Directive (EU) 2022/2555".to_string(),
            source_url: "https://eur-lex.europa.eu/eli/dir/2022/2555/oj".to_string(),
        },
        RegulationDocument {
            regulation: Regulation::AiAct.code().to_string(),
            content: AI_ACT_DIGEST.trim().to_string(),
            article_no: None,
            title: "AI Act - Regulation (EU) 2024/1689".to_string(),
            source_url: "https://eur-lex.europa.eu/eli/reg/2024/1689/oj".to_string(),
        },
    ]
}
