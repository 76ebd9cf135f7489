//! Crate-wide error and domain types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors surfaced by the lexrag pipeline.
///
/// Transient gateway failures (`Storage`, `Embedding`, `Http`) are recovered
/// at the retrieval boundary; only [`RagError::InvalidQuery`] reaches callers
/// of [`crate::retrieval::Retriever::search`].
#[derive(Debug, Error)]
pub enum RagError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("chunking error: {0}")]
    Chunking(String),

    #[error("scrape error: {0}")]
    Scrape(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("unknown regulation code: {0}")]
    UnknownRegulation(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Regulatory instruments the engine ships first-class support for.
///
/// The store itself accepts any lowercase code, so new instruments can be
/// ingested without touching this enum; it exists for typed call sites and
/// for the article-detection mnemonics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regulation {
    Gdpr,
    AiAct,
    Dsa,
    Nis2,
}

impl Regulation {
    /// Canonical lowercase code stored in chunk payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Regulation::Gdpr => "gdpr",
            Regulation::AiAct => "ai_act",
            Regulation::Dsa => "dsa",
            Regulation::Nis2 => "nis2",
        }
    }

    /// All instruments with bundled support.
    pub fn all() -> [Regulation; 4] {
        [
            Regulation::Gdpr,
            Regulation::AiAct,
            Regulation::Dsa,
            Regulation::Nis2,
        ]
    }
}

impl fmt::Display for Regulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Regulation {
    type Err = RagError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "gdpr" => Ok(Regulation::Gdpr),
            "ai_act" | "aiact" | "ai act" => Ok(Regulation::AiAct),
            "dsa" => Ok(Regulation::Dsa),
            "nis2" => Ok(Regulation::Nis2),
            other => Err(RagError::UnknownRegulation(other.to_string())),
        }
    }
}
