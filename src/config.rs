//! Runtime settings loaded from the environment.
//!
//! Every knob has a compiled default, so `Settings::from_env()` succeeds on a
//! bare environment. Overrides use `LEXRAG_`-prefixed variables, e.g.:
//!
//! - `LEXRAG_DATABASE_PATH=/var/lib/lexrag/regulations.sqlite`
//! - `LEXRAG_CHUNK_SIZE=800`
//! - `LEXRAG_ARTICLE_BOOST=0.25`
//!
//! A `.env` file in the working directory is honoured when present.

use std::path::PathBuf;
use std::str::FromStr;

use crate::ingestion::ChunkerConfig;
use crate::retrieval::RankingPolicy;
use crate::types::RagError;

/// Runtime configuration for the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Location of the sqlite database file.
    pub database_path: PathBuf,
    /// Dimensionality the vector collection is created with.
    pub embedding_dimension: usize,
    /// Target chunk length in bytes.
    pub chunk_size: usize,
    /// Bytes of overlap between consecutive chunks.
    pub chunk_overlap: usize,
    /// Score bonus applied to chunks matching a detected article number.
    pub article_boost: f32,
    /// Score assigned to chunks recovered by the exhaustive fallback scan.
    pub fallback_score: f32,
    /// How many payloads the fallback scan reads at most.
    pub scan_limit: usize,
    /// User-Agent header sent by the document fetcher.
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("regulations.sqlite"),
            embedding_dimension: 384,
            chunk_size: crate::ingestion::DEFAULT_CHUNK_SIZE,
            chunk_overlap: crate::ingestion::DEFAULT_CHUNK_OVERLAP,
            article_boost: 0.3,
            fallback_score: 0.9,
            scan_limit: 100,
            user_agent: concat!("lexrag/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] when a variable is present but fails to
    /// parse, or when the resulting values are inconsistent.
    pub fn from_env() -> Result<Self, RagError> {
        dotenvy::dotenv().ok();

        let mut settings = Self::default();
        if let Some(path) = read_var("LEXRAG_DATABASE_PATH") {
            settings.database_path = PathBuf::from(path);
        }
        settings.embedding_dimension =
            parse_var("LEXRAG_EMBEDDING_DIMENSION", settings.embedding_dimension)?;
        settings.chunk_size = parse_var("LEXRAG_CHUNK_SIZE", settings.chunk_size)?;
        settings.chunk_overlap = parse_var("LEXRAG_CHUNK_OVERLAP", settings.chunk_overlap)?;
        settings.article_boost = parse_var("LEXRAG_ARTICLE_BOOST", settings.article_boost)?;
        settings.fallback_score = parse_var("LEXRAG_FALLBACK_SCORE", settings.fallback_score)?;
        settings.scan_limit = parse_var("LEXRAG_SCAN_LIMIT", settings.scan_limit)?;
        if let Some(agent) = read_var("LEXRAG_USER_AGENT") {
            settings.user_agent = agent;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Check internal consistency of the values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.embedding_dimension == 0 {
            return Err(RagError::Config(
                "embedding_dimension must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.article_boost) {
            return Err(RagError::Config(format!(
                "article_boost ({}) must lie in [0, 1]",
                self.article_boost
            )));
        }
        Ok(())
    }

    /// Chunker configuration derived from these settings.
    pub fn chunker(&self) -> ChunkerConfig {
        ChunkerConfig {
            chunk_size: self.chunk_size,
            overlap: self.chunk_overlap,
        }
    }

    /// Ranking policy derived from these settings.
    pub fn ranking(&self) -> RankingPolicy {
        RankingPolicy {
            article_boost: self.article_boost,
            fallback_score: self.fallback_score,
            scan_limit: self.scan_limit,
            ..RankingPolicy::default()
        }
    }
}

fn read_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn parse_var<T>(key: &str, default: T) -> Result<T, RagError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match read_var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|err| RagError::Config(format!("{key}={raw}: {err}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.embedding_dimension, 384);
        assert_eq!(settings.chunk_size, 1000);
        assert_eq!(settings.chunk_overlap, 200);
    }

    #[test]
    fn overlap_must_stay_below_chunk_size() {
        let settings = Settings {
            chunk_overlap: 1000,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(RagError::Config(message)) if message.contains("chunk_overlap")
        ));
    }

    #[test]
    fn boost_outside_unit_interval_is_rejected() {
        let settings = Settings {
            article_boost: 1.5,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn derived_configs_carry_the_settings() {
        let settings = Settings {
            chunk_size: 500,
            chunk_overlap: 50,
            article_boost: 0.2,
            ..Settings::default()
        };
        assert_eq!(settings.chunker().chunk_size, 500);
        assert_eq!(settings.chunker().overlap, 50);
        assert!((settings.ranking().article_boost - 0.2).abs() < f32::EPSILON);
    }
}
