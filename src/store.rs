//! Durable storage for uploaded manuscripts and their reports.
//!
//! Manuscripts are kept verbatim under a timestamped, sanitized name so a
//! directory listing reads chronologically. Reports are JSON files keyed by
//! manuscript id. Persistence is always an explicit opt-in by the caller.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

use crate::config::StorageConfig;
use crate::report::Report;

/// Longest sanitized base name kept in a manuscript filename.
const MAX_BASE_LEN: usize = 64;
/// Content-hash hex chars appended when a name collides.
const COLLISION_SUFFIX_LEN: usize = 8;

/// Creates the manuscript and report directories. Idempotent.
pub fn ensure_dirs(storage: &StorageConfig) -> Result<()> {
    std::fs::create_dir_all(&storage.manuscript_dir).with_context(|| {
        format!(
            "Failed to create manuscript dir: {}",
            storage.manuscript_dir.display()
        )
    })?;
    std::fs::create_dir_all(&storage.report_dir).with_context(|| {
        format!("Failed to create report dir: {}", storage.report_dir.display())
    })?;
    Ok(())
}

/// Strips path separators, control characters, and Windows-reserved
/// characters from a client-supplied base name, then trims surrounding dots
/// and whitespace and truncates to [`MAX_BASE_LEN`] chars. Falls back to
/// `"manuscript"` when nothing survives.
pub fn sanitize_base_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| {
            !c.is_control() && !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
        })
        .take(MAX_BASE_LEN)
        .collect();
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "manuscript".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Writes the raw upload under `<UTC stamp>_<sanitized base>.<ext>`.
///
/// If that name is already taken, the first [`COLLISION_SUFFIX_LEN`] chars of
/// the content hash are appended once. A collision on the suffixed name too
/// means same second, same name, same content; overwriting is then harmless.
/// The existence check races against concurrent writers by nature, which is
/// acceptable for the same reason.
pub fn save_manuscript(
    storage: &StorageConfig,
    original_filename: &str,
    bytes: &[u8],
    content_hash: &str,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let (raw_base, ext) = split_name(original_filename);
    let base = sanitize_base_name(raw_base);
    let stamp = now.format("%Y%m%d-%H%M%S");

    let file_name = match &ext {
        Some(ext) => format!("{stamp}_{base}.{ext}"),
        None => format!("{stamp}_{base}"),
    };
    let mut path = storage.manuscript_dir.join(&file_name);

    if path.exists() {
        let suffix = &content_hash[..content_hash.len().min(COLLISION_SUFFIX_LEN)];
        let disambiguated = match &ext {
            Some(ext) => format!("{stamp}_{base}_{suffix}.{ext}"),
            None => format!("{stamp}_{base}_{suffix}"),
        };
        path = storage.manuscript_dir.join(disambiguated);
    }

    std::fs::write(&path, bytes)
        .with_context(|| format!("Failed to write manuscript: {}", path.display()))?;
    Ok(path)
}

/// Writes the report as pretty JSON under `<manuscript_id>.json`.
pub fn save_report(storage: &StorageConfig, report: &Report) -> Result<PathBuf> {
    let path = storage
        .report_dir
        .join(format!("{}.json", report.manuscript_id));
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(path)
}

/// Loads a previously saved report by id.
///
/// Ids come from clients, so anything outside the generated alphabet (hex
/// digits and dashes) is refused before touching the filesystem. Unknown and
/// malformed ids both read as absent.
pub fn load_report(storage: &StorageConfig, id: &str) -> Result<Option<Report>> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
        return Ok(None);
    }

    let path = storage.report_dir.join(format!("{id}.json"));
    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read report: {}", path.display()))
        }
    };
    let report = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse report: {}", path.display()))?;
    Ok(Some(report))
}

/// Splits a filename into base and extension, keeping only alphanumeric
/// extension characters so the stored name cannot smuggle separators.
fn split_name(filename: &str) -> (&str, Option<String>) {
    match filename.rsplit_once('.') {
        Some((base, raw_ext)) => {
            let ext: String = raw_ext
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .take(16)
                .collect();
            if ext.is_empty() {
                (base, None)
            } else {
                (base, Some(ext.to_ascii_lowercase()))
            }
        }
        None => (filename, None),
    }
}
