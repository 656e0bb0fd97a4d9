//! Rule-based manuscript scoring.
//!
//! Five dimensions, each scored 0..=100 from the [`FeatureSet`] alone. The
//! rules are transparent on purpose: every threshold is a named constant, and
//! the same features always produce the same scores. Causality and market
//! are fixed placeholders until a real signal exists for them.

use serde::{Deserialize, Serialize};

use crate::features::FeatureSet;

/// Starting style score before penalties.
pub const STYLE_BASELINE: f64 = 80.0;
/// Average sentence length above which readability starts to suffer.
pub const STYLE_LEN_SOFT_LIMIT: f64 = 40.0;
/// Average sentence length above which it suffers again.
pub const STYLE_LEN_HARD_LIMIT: f64 = 60.0;
/// Points deducted at each length limit crossed.
pub const STYLE_LEN_PENALTY: f64 = 5.0;
/// Quote ratio below which prose reads as dialogue-starved.
pub const STYLE_QUOTE_FLOOR: f64 = 0.01;
/// Points deducted for dialogue-starved prose.
pub const STYLE_QUOTE_PENALTY: f64 = 5.0;

/// Multiplier turning a quote ratio into a 0..=100 genre-fit score.
pub const GENRE_QUOTE_SCALE: f64 = 2000.0;

/// Starting character score before the dialogue bonus.
pub const CHARACTER_BASELINE: f64 = 70.0;
/// Maximum bonus earned from dialogue density.
pub const CHARACTER_QUOTE_BONUS: f64 = 20.0;
/// Hard cap on the character score.
pub const CHARACTER_CEILING: f64 = 90.0;

/// Placeholder until causal-chain analysis exists.
pub const CAUSALITY_PLACEHOLDER: f64 = 65.0;
/// Placeholder until market comparables exist.
pub const MARKET_PLACEHOLDER: f64 = 68.0;

/// Paragraph count at which the page is considered readably broken up.
pub const READABLE_PARAGRAPH_MIN: usize = 3;
/// Quote ratio above which dialogue counts as a strength.
pub const DIALOGUE_STRENGTH_RATIO: f64 = 0.02;
/// Quote ratio below which scarce dialogue is flagged for improvement.
pub const DIALOGUE_WEAKNESS_RATIO: f64 = 0.01;
/// Average sentence length above which long sentences are flagged.
pub const LONG_SENTENCE_LIMIT: f64 = 50.0;

/// Average sentence length at which the prose reads as deliberate.
pub const TRAIT_LONG_SENTENCE_LEN: f64 = 40.0;
/// Paragraph count above which the manuscript reads as fast-paced.
pub const TRAIT_BRISK_PARAGRAPH_COUNT: usize = 10;

const FANTASY_KEYWORDS: [&str; 6] = ["emperor", "duke", "knight", "magic", "dragon", "sword"];
const ROMANCE_KEYWORDS: [&str; 6] = ["prince", "love", "kiss", "date", "wedding", "heart"];

/// The five scored dimensions, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Genre,
    Style,
    Character,
    Causality,
    Market,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Genre,
        Dimension::Style,
        Dimension::Character,
        Dimension::Causality,
        Dimension::Market,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Genre => "genre",
            Dimension::Style => "style",
            Dimension::Character => "character",
            Dimension::Causality => "causality",
            Dimension::Market => "market",
        }
    }
}

/// Coarse keyword-based genre guess. Advisory only; it never feeds a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreHint {
    Unclassified,
    Fantasy,
    Romance,
}

impl GenreHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenreHint::Unclassified => "unclassified",
            GenreHint::Fantasy => "fantasy (tentative)",
            GenreHint::Romance => "romance (tentative)",
        }
    }
}

/// Everything the scoring rules produce for one manuscript.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    /// Dimension scores in [`Dimension::ALL`] order.
    pub scores: Vec<(Dimension, f64)>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub style_traits: Vec<String>,
}

/// Scores a feature set. Pure and deterministic.
pub fn score(features: &FeatureSet) -> ScoreOutcome {
    let scores = vec![
        (Dimension::Genre, genre_score(features)),
        (Dimension::Style, style_score(features)),
        (Dimension::Character, character_score(features)),
        (Dimension::Causality, CAUSALITY_PLACEHOLDER),
        (Dimension::Market, MARKET_PLACEHOLDER),
    ];

    let mut strengths = Vec::new();
    if features.num_paragraphs >= READABLE_PARAGRAPH_MIN {
        strengths.push(
            "Paragraph breaks come often enough to keep the page readable.".to_string(),
        );
    }
    if features.quote_ratio > DIALOGUE_STRENGTH_RATIO {
        strengths.push(
            "Dialogue carries real weight; the characters get to speak for themselves.".to_string(),
        );
    }

    let mut improvements = Vec::new();
    if features.quote_ratio < DIALOGUE_WEAKNESS_RATIO {
        improvements.push(
            "Dialogue is scarce, which keeps the cast's voices from coming through.".to_string(),
        );
    }
    if features.avg_sentence_len > LONG_SENTENCE_LIMIT {
        improvements.push(
            "Sentences run long; splitting a few would give the reader room to breathe.".to_string(),
        );
    }

    let mut style_traits = Vec::new();
    if features.avg_sentence_len >= TRAIT_LONG_SENTENCE_LEN {
        style_traits.push(
            "Leans on long sentences; the effect is unhurried, almost lyrical.".to_string(),
        );
    } else {
        style_traits.push("Short sentences dominate, giving the prose a brisk tempo.".to_string());
    }
    if features.num_paragraphs > TRAIT_BRISK_PARAGRAPH_COUNT {
        style_traits.push("Paragraphs turn over quickly; the pacing reads fast.".to_string());
    }

    ScoreOutcome {
        scores,
        strengths,
        improvements,
        style_traits,
    }
}

/// Keyword scan over the lowercased text. Romance is checked last so it wins
/// when both keyword sets match.
pub fn genre_hint(text: &str) -> GenreHint {
    let lower = text.to_lowercase();
    let mut hint = GenreHint::Unclassified;
    if FANTASY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        hint = GenreHint::Fantasy;
    }
    if ROMANCE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        hint = GenreHint::Romance;
    }
    hint
}

/// Dialogue density scaled into 0..=100.
fn genre_score(features: &FeatureSet) -> f64 {
    (features.quote_ratio * GENRE_QUOTE_SCALE).min(100.0)
}

/// Baseline minus sentence-length and missing-dialogue penalties.
fn style_score(features: &FeatureSet) -> f64 {
    let mut score = STYLE_BASELINE;
    if features.avg_sentence_len > STYLE_LEN_SOFT_LIMIT {
        score -= STYLE_LEN_PENALTY;
    }
    if features.avg_sentence_len > STYLE_LEN_HARD_LIMIT {
        score -= STYLE_LEN_PENALTY;
    }
    if features.quote_ratio < STYLE_QUOTE_FLOOR {
        score -= STYLE_QUOTE_PENALTY;
    }
    score.max(0.0)
}

/// Baseline plus a dialogue bonus, capped.
fn character_score(features: &FeatureSet) -> f64 {
    (CHARACTER_BASELINE + features.quote_ratio * CHARACTER_QUOTE_BONUS).min(CHARACTER_CEILING)
}
