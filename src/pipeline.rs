//! Decode → features → scores → report, as one synchronous call.
//!
//! Per-manuscript state lives on the stack of [`analyze`]; nothing here is
//! shared or mutated across calls, so callers may run analyses concurrently
//! without coordination.

use std::time::Instant;

use sha2::{Digest, Sha256};

use crate::decode::{self, DecodeError};
use crate::features::{self, FeatureSet};
use crate::report::{self, Report};
use crate::score::{self, GenreHint};

/// A manuscript as received: the claimed filename and the raw bytes.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Hex SHA-256 of `bytes`.
    pub content_hash: String,
}

impl Document {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Document {
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let content_hash = hex::encode(hasher.finalize());
        Document {
            filename: filename.into(),
            bytes,
            content_hash,
        }
    }
}

/// The report plus the intermediate results worth showing a human.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub report: Report,
    pub features: FeatureSet,
    pub style_traits: Vec<String>,
    pub genre_hint: GenreHint,
}

/// Runs the whole pipeline over one document.
///
/// The only failure path is decoding; from extracted text onward every stage
/// is total. `processing_ms` on the report covers decode through assembly.
pub fn analyze(document: &Document) -> Result<Analysis, DecodeError> {
    let started = Instant::now();

    let text = decode::decode(&document.filename, &document.bytes)?;
    let features = features::extract(&text);
    let outcome = score::score(&features);
    let genre_hint = score::genre_hint(&text);

    let report = report::assemble(
        &document.content_hash,
        &document.filename,
        &features,
        &outcome,
        genre_hint,
        started.elapsed().as_millis() as u64,
    );

    Ok(Analysis {
        report,
        features,
        style_traits: outcome.style_traits,
        genre_hint,
    })
}
