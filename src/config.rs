use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::decode;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Origins allowed by CORS. `"*"` anywhere in the list means any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Default tracing filter; `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: default_cors_origins(),
            log_level: default_log_level(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,
    /// Extensions accepted at the upload boundary, stored lowercase without
    /// leading dots.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: default_max_upload_mb(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

fn default_max_upload_mb() -> u64 {
    10
}
fn default_allowed_extensions() -> Vec<String> {
    vec![
        "txt".to_string(),
        "md".to_string(),
        "pdf".to_string(),
        "docx".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_manuscript_dir")]
    pub manuscript_dir: PathBuf,
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            manuscript_dir: default_manuscript_dir(),
            report_dir: default_report_dir(),
        }
    }
}

fn default_manuscript_dir() -> PathBuf {
    PathBuf::from("data/manuscripts")
}
fn default_report_dir() -> PathBuf {
    PathBuf::from("data/reports")
}

/// Upload pre-check failures. Callers surface these before any decoding
/// work starts.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("extension .{0} is not allowed")]
    DisallowedExtension(String),
    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },
}

impl LimitsConfig {
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }

    /// Allow-list check on the claimed filename. A name with no dot at all
    /// passes; the decoder treats it as plain text.
    pub fn check_extension(&self, filename: &str) -> std::result::Result<(), UploadError> {
        if let Some(ext) = decode::extension_of(filename) {
            if !self.allowed_extensions.iter().any(|allowed| *allowed == ext) {
                return Err(UploadError::DisallowedExtension(ext));
            }
        }
        Ok(())
    }

    pub fn check_size(&self, size: u64) -> std::result::Result<(), UploadError> {
        let limit = self.max_upload_bytes();
        if size > limit {
            return Err(UploadError::TooLarge { size, limit });
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file. A missing file is not an error:
/// every field has a default, so the tool runs configless. A file that
/// exists but fails to parse or validate is.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate server
    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    // Validate limits
    if config.limits.max_upload_mb == 0 {
        anyhow::bail!("limits.max_upload_mb must be >= 1");
    }
    if config.limits.allowed_extensions.is_empty() {
        anyhow::bail!("limits.allowed_extensions must not be empty");
    }
    for ext in &mut config.limits.allowed_extensions {
        *ext = ext.trim_start_matches('.').to_ascii_lowercase();
    }

    Ok(config)
}
