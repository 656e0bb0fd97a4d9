//! Report data model and assembly.
//!
//! The types here are the wire contract: they serialize to the JSON shape
//! returned by the HTTP API, saved to disk, and printed by `--json`. Field
//! names are snake_case and dimension labels are lowercase strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::features::FeatureSet;
use crate::score::{
    Dimension, GenreHint, ScoreOutcome, CHARACTER_BASELINE, CHARACTER_CEILING, STYLE_BASELINE,
};

/// Style evidence is measured from the prose itself.
const CONFIDENCE_DIRECT: f64 = 0.9;
/// Character evidence rests on one real signal, heavily smoothed.
const CONFIDENCE_PARTIAL: f64 = 0.6;
/// Genre evidence uses dialogue density as a stand-in.
const CONFIDENCE_PROXY: f64 = 0.4;
/// Causality and market carry constants, not measurements.
const CONFIDENCE_PLACEHOLDER: f64 = 0.2;

/// One supporting measurement attached to a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zscore: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Where a section's score came from and how much to trust it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub source_id: String,
    pub snippet: String,
    pub confidence: f64,
}

/// Score, metrics, and evidence for one dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionScore {
    pub label: Dimension,
    pub score: f64,
    pub metrics: Vec<Metric>,
    pub evidence: Vec<Evidence>,
}

/// The complete analysis report for one manuscript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Content-hash prefix plus analysis timestamp; unique per run.
    pub manuscript_id: String,
    /// Original filename as uploaded.
    pub title: String,
    /// Unweighted mean of the section scores.
    pub total_score: f64,
    pub sections: Vec<SectionScore>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
    pub processing_ms: u64,
}

/// Builds the report from a scored manuscript.
///
/// `content_hash` is the hex digest of the raw upload; its first 16 chars
/// seed the manuscript id, and the analysis timestamp in nanoseconds makes
/// repeated runs over identical bytes produce distinct ids.
pub fn assemble(
    content_hash: &str,
    title: &str,
    features: &FeatureSet,
    outcome: &ScoreOutcome,
    hint: GenreHint,
    processing_ms: u64,
) -> Report {
    let analyzed_at = Utc::now();
    let seed = &content_hash[..content_hash.len().min(16)];
    let manuscript_id = format!(
        "{}-{}",
        seed,
        analyzed_at.timestamp_nanos_opt().unwrap_or_default()
    );

    let sections: Vec<SectionScore> = outcome
        .scores
        .iter()
        .map(|(dimension, value)| section_for(*dimension, *value, features, hint))
        .collect();

    Report {
        manuscript_id,
        title: title.to_string(),
        total_score: mean(outcome.scores.iter().map(|(_, value)| *value)),
        sections,
        strengths: outcome.strengths.clone(),
        improvements: outcome.improvements.clone(),
        analyzed_at,
        processing_ms,
    }
}

/// Unweighted mean, the only aggregation used anywhere a total is shown.
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }
    sum / count.max(1) as f64
}

fn metric(name: &str, value: f64, unit: Option<&str>) -> Metric {
    Metric {
        name: name.to_string(),
        value,
        unit: unit.map(str::to_string),
        zscore: None,
        note: None,
    }
}

fn evidence(snippet: String, confidence: f64) -> Evidence {
    Evidence {
        source_id: "rule".to_string(),
        snippet,
        confidence,
    }
}

fn section_for(
    dimension: Dimension,
    score: f64,
    features: &FeatureSet,
    hint: GenreHint,
) -> SectionScore {
    let (metrics, evidence) = match dimension {
        Dimension::Genre => {
            let mut quote = metric("quote_ratio", features.quote_ratio, None);
            quote.note = Some(format!("keyword hint: {}", hint.as_str()));
            (
                vec![quote],
                evidence(
                    "dialogue density scaled into 0-100 as a stand-in for genre fit".to_string(),
                    CONFIDENCE_PROXY,
                ),
            )
        }
        Dimension::Style => (
            vec![
                metric("avg_sentence_len", features.avg_sentence_len, Some("chars")),
                metric("quote_ratio", features.quote_ratio, None),
                metric("num_sentences", features.num_sentences as f64, None),
            ],
            evidence(
                format!(
                    "baseline {STYLE_BASELINE} minus sentence-length and missing-dialogue penalties"
                ),
                CONFIDENCE_DIRECT,
            ),
        ),
        Dimension::Character => (
            vec![metric("quote_ratio", features.quote_ratio, None)],
            evidence(
                format!(
                    "baseline {CHARACTER_BASELINE} plus a dialogue bonus, capped at {CHARACTER_CEILING}"
                ),
                CONFIDENCE_PARTIAL,
            ),
        ),
        Dimension::Causality => (
            vec![metric("num_paragraphs", features.num_paragraphs as f64, None)],
            evidence(
                "fixed placeholder; no causal-chain signal is measured yet".to_string(),
                CONFIDENCE_PLACEHOLDER,
            ),
        ),
        Dimension::Market => (
            vec![metric("num_chars", features.num_chars as f64, None)],
            evidence(
                "fixed placeholder; no market comparables are measured yet".to_string(),
                CONFIDENCE_PLACEHOLDER,
            ),
        ),
    };

    SectionScore {
        label: dimension,
        score,
        metrics,
        evidence: vec![evidence],
    }
}
