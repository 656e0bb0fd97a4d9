//! # Slushpile CLI (`slush`)
//!
//! The `slush` binary analyzes manuscript files and serves the same
//! analysis over HTTP. Heuristics only: every score is a transparent rule
//! over measured prose statistics, computed locally.
//!
//! ## Usage
//!
//! ```bash
//! slush --config ./config/slush.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `slush init` | Create the manuscript and report storage directories |
//! | `slush analyze <file>` | Analyze a manuscript and print its report |
//! | `slush serve` | Start the analysis HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Prepare storage directories
//! slush init --config ./config/slush.toml
//!
//! # Analyze a draft and print the human-readable summary
//! slush analyze drafts/harbor.txt
//!
//! # Print the raw report JSON instead
//! slush analyze drafts/harbor.txt --json
//!
//! # Keep a copy of the upload and the report on disk
//! slush analyze drafts/harbor.docx --persist --save-report
//!
//! # Serve the HTTP API
//! slush serve --config ./config/slush.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use slushpile::config::{self, Config};
use slushpile::pipeline::{self, Document};
use slushpile::server;
use slushpile::store;

/// Slushpile: heuristic manuscript scoring for slush-pile triage.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/slush.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "slush",
    about = "Slushpile: heuristic manuscript scoring for slush-pile triage",
    version,
    long_about = "Slushpile decodes manuscript files (txt, md, pdf, docx), measures prose \
    statistics (sentence length, paragraph density, dialogue ratio), and scores five dimensions \
    with transparent deterministic rules. Reports are available from a CLI and a JSON HTTP API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/slush.toml`. Every setting has a default, so a
    /// missing file just means the tool runs with defaults.
    #[arg(long, global = true, default_value = "./config/slush.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Create the storage directories.
    ///
    /// Creates `[storage].manuscript_dir` and `[storage].report_dir`.
    /// Idempotent; running it multiple times is safe.
    Init,

    /// Analyze a manuscript file and print its report.
    ///
    /// Decodes the file, measures prose statistics, scores the five
    /// dimensions, and prints either a human-readable summary or the raw
    /// report JSON.
    Analyze {
        /// Path to the manuscript (txt, md, pdf, or docx).
        file: PathBuf,

        /// Also save the original file into the manuscript directory.
        #[arg(long)]
        persist: bool,

        /// Also save the report JSON into the report directory.
        #[arg(long)]
        save_report: bool,

        /// Print the raw report JSON instead of the human summary.
        #[arg(long)]
        json: bool,
    },

    /// Start the analysis HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves
    /// `POST /analyze`, `GET /reports/{id}`, and `GET /health`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    init_tracing(&cfg.server.log_level);

    match cli.command {
        Commands::Init => {
            store::ensure_dirs(&cfg.storage)?;
            println!("storage ready:");
            println!("  manuscripts: {}", cfg.storage.manuscript_dir.display());
            println!("  reports:     {}", cfg.storage.report_dir.display());
        }
        Commands::Analyze {
            file,
            persist,
            save_report,
            json,
        } => {
            run_analyze(&cfg, &file, persist, save_report, json)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays parseable (`--json`, the server's
/// listening line). `RUST_LOG` overrides the configured level.
fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_analyze(
    cfg: &Config,
    file: &Path,
    persist: bool,
    save_report: bool,
    json: bool,
) -> anyhow::Result<()> {
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string());
    let bytes = std::fs::read(file)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;

    cfg.limits.check_extension(&filename)?;
    cfg.limits.check_size(bytes.len() as u64)?;

    let document = Document::new(filename, bytes);
    let analysis = pipeline::analyze(&document)?;

    // Persistence failures never suppress the report; the cause goes to
    // stderr and the run still succeeds, matching the HTTP handler.
    if persist || save_report {
        if let Err(e) = store::ensure_dirs(&cfg.storage) {
            eprintln!("warning: storage directories unavailable: {e:#}");
        }
    }
    if persist {
        match store::save_manuscript(
            &cfg.storage,
            &document.filename,
            &document.bytes,
            &document.content_hash,
            chrono::Utc::now(),
        ) {
            Ok(path) => eprintln!("manuscript saved: {}", path.display()),
            Err(e) => eprintln!("warning: manuscript not saved: {e:#}"),
        }
    }
    if save_report {
        match store::save_report(&cfg.storage, &analysis.report) {
            Ok(path) => eprintln!("report saved: {}", path.display()),
            Err(e) => eprintln!("warning: report not saved: {e:#}"),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis.report)?);
    } else {
        print_summary(&analysis);
    }

    Ok(())
}

fn print_summary(analysis: &pipeline::Analysis) {
    let report = &analysis.report;
    let features = &analysis.features;

    println!("Manuscript Report: {}", report.title);
    println!("========================================");
    println!();
    println!("  Total score: {:.1} / 100", report.total_score);
    println!();
    for section in &report.sections {
        println!("  {:<10} {:>5.1}", section.label.as_str(), section.score);
    }
    println!();
    println!("  Paragraphs:  {}", features.num_paragraphs);
    println!(
        "  Sentences:   {} (avg {:.1} chars)",
        features.num_sentences, features.avg_sentence_len
    );
    println!("  Quote ratio: {:.3}", features.quote_ratio);
    println!("  Genre hint:  {}", analysis.genre_hint.as_str());

    if !report.strengths.is_empty() {
        println!();
        println!("  Strengths:");
        for line in &report.strengths {
            println!("    + {}", line);
        }
    }
    if !report.improvements.is_empty() {
        println!();
        println!("  Improvements:");
        for line in &report.improvements {
            println!("    - {}", line);
        }
    }
    if !analysis.style_traits.is_empty() {
        println!();
        println!("  Style:");
        for line in &analysis.style_traits {
            println!("    * {}", line);
        }
    }

    println!();
    println!(
        "  analyzed in {} ms  (id {})",
        report.processing_ms, report.manuscript_id
    );
}
