//! Overlapping, sentence-aligned text chunking and content-addressed chunk ids.

use uuid::Uuid;

/// Default window size in bytes for a single chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap carried between consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// How far back from the window end to look for a sentence terminator.
const SENTENCE_LOOKBACK: usize = 100;
/// How many leading characters of a chunk participate in its identity.
const ID_PREFIX_CHARS: usize = 100;

/// Window parameters for [`chunk_text`].
#[derive(Clone, Copy, Debug)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Splits `text` into overlapping chunks, preferring to cut just after a
/// sentence terminator (`". "`) found in the trailing [`SENTENCE_LOOKBACK`]
/// bytes of each window.
///
/// Empty or whitespace-only input yields an empty vec. Input that fits in a
/// single window is returned whole (trimmed). Cut points are snapped to UTF-8
/// character boundaries, and the loop always advances by at least one
/// character even when `overlap >= chunk_size`.
pub fn chunk_text(text: &str, config: ChunkerConfig) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    if text.len() <= config.chunk_size {
        return vec![text.trim().to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < text.len() {
        let mut end = floor_char_boundary(text, (start + config.chunk_size).min(text.len()));

        if end < text.len() {
            let lookback = floor_char_boundary(text, end.saturating_sub(SENTENCE_LOOKBACK));
            if let Some(pos) = text[lookback..end].rfind(". ") {
                let cut = lookback + pos + 1;
                // The terminator itself must sit past `start`, otherwise a
                // window opening on ". " would shrink to a bare period.
                if cut > start + 1 {
                    end = cut;
                }
            }
        }

        let piece = text[start..end].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        if end >= text.len() {
            break;
        }

        let mut next = floor_char_boundary(text, end.saturating_sub(config.overlap));
        if next <= start {
            // Overlap consumed the whole step; force forward progress.
            next = next_char_boundary(text, start + 1);
        }
        start = next;
    }

    chunks
}

/// Derives the stable, content-addressed identifier for a chunk.
///
/// The id is a name-based UUID over `regulation`, `article_no` and the first
/// [`ID_PREFIX_CHARS`] characters of the content, so re-ingesting identical
/// content for the same regulation/article overwrites the stored point
/// instead of duplicating it.
pub fn chunk_point_id(content: &str, regulation: &str, article_no: Option<u32>) -> Uuid {
    let article = match article_no {
        Some(n) => n.to_string(),
        None => "none".to_string(),
    };
    let prefix: String = content.chars().take(ID_PREFIX_CHARS).collect();
    let key = format!("{regulation}_{article}_{prefix}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn next_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
