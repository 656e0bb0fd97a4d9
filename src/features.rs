//! Statistical prose features.
//!
//! Everything here is a pure function of the extracted text: no config, no
//! I/O, no failure path. Degenerate input (empty text, no sentence-final
//! punctuation) produces floor values instead of errors; bad writing is a
//! valid manuscript, not a fault.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters counted as quotation marks: straight and curly, double and
/// single. Curly forms are what word processors emit; straight forms are
/// what plain-text drafts use.
const QUOTE_CHARS: [char; 6] = ['"', '\u{201C}', '\u{201D}', '\'', '\u{2018}', '\u{2019}'];

/// Sentence boundary: a run of terminal punctuation followed by whitespace.
/// Requiring the whitespace keeps decimals and abbreviation dots intact.
static SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?…]+\s+").unwrap());

/// Deterministic statistics for one manuscript.
///
/// Invariants: `num_sentences >= 1` (floored so downstream averages never
/// divide by zero), `quote_ratio` is clamped to `[0, 1]`, and every count is
/// a plain non-negative total.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    /// Lines containing non-whitespace content.
    pub num_paragraphs: usize,
    /// Sentence fragments after boundary splitting, floored at 1.
    pub num_sentences: usize,
    /// Mean character length of the sentence fragments.
    pub avg_sentence_len: f64,
    /// Quotation-mark characters over total characters of the full text.
    pub quote_ratio: f64,
    /// Total character count of the full text.
    pub num_chars: usize,
}

/// Computes the feature set for a manuscript. Never fails.
pub fn extract(text: &str) -> FeatureSet {
    let num_paragraphs = text.lines().filter(|line| !line.trim().is_empty()).count();

    let sentences: Vec<&str> = SENTENCE_BOUNDARY
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    // Floor, not error: empty input still divides cleanly below.
    let num_sentences = sentences.len().max(1);
    let sentence_chars: usize = sentences.iter().map(|s| s.chars().count()).sum();
    let avg_sentence_len = sentence_chars as f64 / num_sentences as f64;

    let num_chars = text.chars().count();
    let quote_chars = text.chars().filter(|c| QUOTE_CHARS.contains(c)).count();
    let quote_ratio = if num_chars == 0 {
        0.0
    } else {
        (quote_chars as f64 / num_chars as f64).clamp(0.0, 1.0)
    };

    FeatureSet {
        num_paragraphs,
        num_sentences,
        avg_sentence_len,
        quote_ratio,
        num_chars,
    }
}
