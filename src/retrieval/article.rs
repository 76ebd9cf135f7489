//! Detection of explicit article references in user queries.

use regex::Regex;

/// Ordered set of patterns recognizing "article N" phrasings.
///
/// The query is lowercased and the patterns are tried in order: generic
/// `article N` forms first, then the `art N` abbreviation, then bare
/// regulation mnemonics (`gdpr 6`), then the `article #N` spelling. The
/// first capture wins; queries naming several articles resolve to whichever
/// pattern matches first in this order.
pub struct ArticleDetector {
    patterns: Vec<Regex>,
}

impl ArticleDetector {
    pub fn new() -> Self {
        let sources = [
            r"article\s*(\d+)",
            r"art\.?\s*(\d+)",
            r"gdpr\s*(\d+)",
            r"ai[\s_-]*act\s*(\d+)",
            r"dsa\s*(\d+)",
            r"nis\s*2\s+(\d+)",
            r"article\s*#\s*(\d+)",
        ];
        let patterns = sources
            .iter()
            .map(|source| Regex::new(source).expect("article pattern must compile"))
            .collect();
        Self { patterns }
    }

    /// Returns the first article number found, or `None` if the query does
    /// not reference a specific article.
    pub fn detect(&self, query: &str) -> Option<u32> {
        let query = query.to_lowercase();
        for pattern in &self.patterns {
            if let Some(captures) = pattern.captures(&query) {
                if let Some(number) = captures.get(1).and_then(|m| m.as_str().parse().ok()) {
                    return Some(number);
                }
            }
        }
        None
    }
}

impl Default for ArticleDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_plain_article_references() {
        let detector = ArticleDetector::new();
        assert_eq!(detector.detect("What does Article 17 say?"), Some(17));
        assert_eq!(detector.detect("explain article6"), Some(6));
    }

    #[test]
    fn detects_abbreviated_forms() {
        let detector = ArticleDetector::new();
        assert_eq!(detector.detect("summarise art. 9"), Some(9));
        assert_eq!(detector.detect("art 22 automated decisions"), Some(22));
    }

    #[test]
    fn detects_regulation_mnemonics() {
        let detector = ArticleDetector::new();
        assert_eq!(detector.detect("GDPR 6 lawful basis"), Some(6));
        assert_eq!(detector.detect("what is dsa 17 about"), Some(17));
        assert_eq!(detector.detect("nis2 23 reporting duties"), Some(23));
        assert_eq!(detector.detect("ai act 5 prohibitions"), Some(5));
    }

    #[test]
    fn detects_hash_spelling() {
        let detector = ArticleDetector::new();
        assert_eq!(detector.detect("article #12"), Some(12));
    }

    #[test]
    fn open_ended_queries_have_no_article() {
        let detector = ArticleDetector::new();
        assert_eq!(detector.detect("how do I report a breach?"), None);
        assert_eq!(detector.detect("what is a data processor"), None);
    }

    #[test]
    fn first_pattern_match_wins() {
        let detector = ArticleDetector::new();
        // Both "article 17" and "gdpr 6" appear; the article pattern is
        // earlier in the scan order.
        assert_eq!(detector.detect("compare gdpr 6 with article 17"), Some(17));
    }
}
