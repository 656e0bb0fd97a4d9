//! End-to-end tests for the `slush` binary: analyze across formats, the
//! JSON output contract, opt-in persistence, and upload rejections.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const SAMPLE_TEXT: &str = "The dragon kept to the cliffs that season. Nobody in the village would say so.\n\n\
\"You saw it too,\" said Mara. \"Last night, over the water.\"\n\n\
Tomas said nothing. He had seen it twice.\n";

fn slush_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("slush");
    path
}

fn setup_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    fs::create_dir_all(root.join("config")).unwrap();
    fs::create_dir_all(root.join("drafts")).unwrap();

    let config_content = format!(
        r#"[server]
bind = "127.0.0.1:0"

[limits]
max_upload_mb = 1
allowed_extensions = ["txt", "md", "pdf", "docx"]

[storage]
manuscript_dir = "{root}/data/manuscripts"
report_dir = "{root}/data/reports"
"#,
        root = root.display()
    );
    let config_path = root.join("config").join("slush.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_slush(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = slush_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run slush: {}", e));
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Minimal docx (ZIP) with one `word/document.xml` paragraph per entry.
fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
            body
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

/// A structurally valid single-page PDF with one text run. Whether the text
/// survives extraction depends on the extractor's font handling, so tests
/// assert pipeline success rather than extracted content.
fn pdf_bytes() -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![100.into(), 700.into()]),
            Operation::new(
                "Tj",
                vec![Object::string_literal(
                    "The rain had not stopped for three days.",
                )],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

#[test]
fn analyze_text_prints_summary() {
    let (_tmp, config_path) = setup_env();
    let draft = _tmp.path().join("drafts").join("dragon.txt");
    fs::write(&draft, SAMPLE_TEXT).unwrap();

    let (stdout, stderr, success) =
        run_slush(&config_path, &["analyze", draft.to_str().unwrap()]);
    assert!(success, "analyze failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Total score"), "missing total: {}", stdout);
    assert!(stdout.contains("genre"), "missing sections: {}", stdout);
    assert!(stdout.contains("Strengths"), "missing strengths: {}", stdout);
    assert!(stdout.contains("fantasy"), "missing genre hint: {}", stdout);
}

#[test]
fn analyze_json_matches_the_report_contract() {
    let (_tmp, config_path) = setup_env();
    let draft = _tmp.path().join("drafts").join("dragon.txt");
    fs::write(&draft, SAMPLE_TEXT).unwrap();

    let (stdout, stderr, success) =
        run_slush(&config_path, &["analyze", draft.to_str().unwrap(), "--json"]);
    assert!(success, "analyze failed: {}", stderr);

    let report: serde_json::Value = serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("stdout is not JSON ({}): {}", e, stdout));

    let total = report["total_score"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&total), "total out of range: {}", total);

    let sections = report["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 5);
    let labels: Vec<&str> = sections
        .iter()
        .map(|s| s["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, ["genre", "style", "character", "causality", "market"]);
    for section in sections {
        let score = section["score"].as_f64().unwrap();
        assert!((0.0..=100.0).contains(&score));
        assert!(!section["evidence"].as_array().unwrap().is_empty());
    }

    assert!(!report["manuscript_id"].as_str().unwrap().is_empty());
    assert_eq!(report["title"], "dragon.txt");
    assert!(report["processing_ms"].as_u64().is_some());
    assert!(report["analyzed_at"].as_str().is_some());
    // Persistence flags only appear on HTTP responses that asked for them.
    assert!(report.get("persisted").is_none());
}

#[test]
fn genre_hint_rides_on_the_genre_metric() {
    let (_tmp, config_path) = setup_env();
    let draft = _tmp.path().join("drafts").join("dragon.txt");
    fs::write(&draft, SAMPLE_TEXT).unwrap();

    let (stdout, _, success) =
        run_slush(&config_path, &["analyze", draft.to_str().unwrap(), "--json"]);
    assert!(success);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let note = report["sections"][0]["metrics"][0]["note"].as_str().unwrap();
    assert!(note.contains("fantasy"), "unexpected note: {}", note);
}

#[test]
fn persist_and_save_report_write_files() {
    let (_tmp, config_path) = setup_env();
    let root = _tmp.path();
    let draft = root.join("drafts").join("dragon.txt");
    fs::write(&draft, SAMPLE_TEXT).unwrap();

    let (stdout, stderr, success) = run_slush(
        &config_path,
        &[
            "analyze",
            draft.to_str().unwrap(),
            "--persist",
            "--save-report",
            "--json",
        ],
    );
    assert!(success, "analyze failed: {}", stderr);

    let manuscripts: Vec<_> = fs::read_dir(root.join("data/manuscripts"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(manuscripts.len(), 1, "expected one saved manuscript");
    assert_eq!(fs::read(&manuscripts[0]).unwrap(), SAMPLE_TEXT.as_bytes());
    let saved_name = manuscripts[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(saved_name.ends_with(".txt"), "bad name: {}", saved_name);
    assert!(saved_name.contains("dragon"), "bad name: {}", saved_name);

    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let id = report["manuscript_id"].as_str().unwrap();
    let report_path = root.join("data/reports").join(format!("{}.json", id));
    assert!(report_path.is_file(), "missing {}", report_path.display());
    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(saved["total_score"], report["total_score"]);
}

#[test]
fn same_name_twice_keeps_both_payloads() {
    let (_tmp, config_path) = setup_env();
    let root = _tmp.path();
    let draft = root.join("drafts").join("dup.txt");

    fs::write(&draft, "First version. Nothing else.\n").unwrap();
    let (_, stderr, success) =
        run_slush(&config_path, &["analyze", draft.to_str().unwrap(), "--persist"]);
    assert!(success, "first analyze failed: {}", stderr);

    fs::write(&draft, "Second version. Rather different.\n").unwrap();
    let (_, stderr, success) =
        run_slush(&config_path, &["analyze", draft.to_str().unwrap(), "--persist"]);
    assert!(success, "second analyze failed: {}", stderr);

    let contents: Vec<Vec<u8>> = fs::read_dir(root.join("data/manuscripts"))
        .unwrap()
        .map(|e| fs::read(e.unwrap().path()).unwrap())
        .collect();
    assert_eq!(contents.len(), 2, "a persisted manuscript was overwritten");
    assert!(contents.contains(&b"First version. Nothing else.\n".to_vec()));
    assert!(contents.contains(&b"Second version. Rather different.\n".to_vec()));
}

#[test]
fn failed_persistence_still_prints_the_report() {
    let (_tmp, config_path) = setup_env();
    let root = _tmp.path();
    let draft = root.join("drafts").join("dragon.txt");
    fs::write(&draft, SAMPLE_TEXT).unwrap();
    // A file where the storage tree should go makes every save fail.
    fs::write(root.join("data"), "").unwrap();

    let (stdout, stderr, success) = run_slush(
        &config_path,
        &[
            "analyze",
            draft.to_str().unwrap(),
            "--persist",
            "--save-report",
            "--json",
        ],
    );
    assert!(success, "analysis must survive failed persistence: {}", stderr);
    assert!(stderr.contains("warning"), "expected a warning: {}", stderr);
    let report: serde_json::Value = serde_json::from_str(&stdout)
        .unwrap_or_else(|e| panic!("stdout is not JSON ({}): {}", e, stdout));
    assert!(report["total_score"].as_f64().is_some());
}

#[test]
fn docx_analyzes_end_to_end() {
    let (_tmp, config_path) = setup_env();
    let draft = _tmp.path().join("drafts").join("scene.docx");
    fs::write(
        &draft,
        docx_bytes(&[
            "The office was empty by six.",
            "\u{201C}Stay a minute,\u{201D} she said.",
            "He stayed an hour.",
        ]),
    )
    .unwrap();

    let (stdout, stderr, success) =
        run_slush(&config_path, &["analyze", draft.to_str().unwrap(), "--json"]);
    assert!(success, "docx analyze failed: {}", stderr);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["title"], "scene.docx");
    // Paragraph count is surfaced as the causality section's metric.
    assert_eq!(report["sections"][3]["metrics"][0]["value"], 3.0);
}

#[test]
fn valid_pdf_analyzes_end_to_end() {
    let (_tmp, config_path) = setup_env();
    let draft = _tmp.path().join("drafts").join("rain.pdf");
    fs::write(&draft, pdf_bytes()).unwrap();

    let (stdout, stderr, success) =
        run_slush(&config_path, &["analyze", draft.to_str().unwrap(), "--json"]);
    assert!(success, "pdf analyze failed: stdout={}, stderr={}", stdout, stderr);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["sections"].as_array().unwrap().len(), 5);
}

#[test]
fn corrupt_pdf_fails_extraction() {
    let (_tmp, config_path) = setup_env();
    let draft = _tmp.path().join("drafts").join("bad.pdf");
    fs::write(&draft, b"not a valid pdf").unwrap();

    let (_, stderr, success) = run_slush(&config_path, &["analyze", draft.to_str().unwrap()]);
    assert!(!success, "corrupt pdf must fail");
    assert!(
        stderr.contains("pdf extraction failed"),
        "unexpected stderr: {}",
        stderr
    );
}

#[test]
fn disallowed_extension_is_rejected() {
    let (_tmp, config_path) = setup_env();
    let draft = _tmp.path().join("drafts").join("story.epub");
    fs::write(&draft, b"whatever").unwrap();

    let (_, stderr, success) = run_slush(&config_path, &["analyze", draft.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("not allowed"), "unexpected stderr: {}", stderr);
}

#[test]
fn oversized_file_is_rejected() {
    let (_tmp, config_path) = setup_env();
    let draft = _tmp.path().join("drafts").join("big.txt");
    fs::write(&draft, vec![b'a'; 1024 * 1024 + 1]).unwrap();

    let (_, stderr, success) = run_slush(&config_path, &["analyze", draft.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("too large"), "unexpected stderr: {}", stderr);
}

#[test]
fn file_without_extension_reads_as_plain_text() {
    let (_tmp, config_path) = setup_env();
    let draft = _tmp.path().join("drafts").join("notes");
    fs::write(&draft, "One line of notes. Another one.\n").unwrap();

    let (stdout, stderr, success) =
        run_slush(&config_path, &["analyze", draft.to_str().unwrap(), "--json"]);
    assert!(success, "extensionless analyze failed: {}", stderr);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["title"], "notes");
}

#[test]
fn missing_file_reports_a_read_error() {
    let (_tmp, config_path) = setup_env();
    let missing = _tmp.path().join("drafts").join("nope.txt");

    let (_, stderr, success) = run_slush(&config_path, &["analyze", missing.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Failed to read"), "unexpected stderr: {}", stderr);
}

#[test]
fn init_creates_storage_directories() {
    let (_tmp, config_path) = setup_env();
    let root = _tmp.path();

    let (stdout, stderr, success) = run_slush(&config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);
    assert!(stdout.contains("storage ready"), "unexpected stdout: {}", stdout);
    assert!(root.join("data/manuscripts").is_dir());
    assert!(root.join("data/reports").is_dir());

    let (_, stderr, success) = run_slush(&config_path, &["init"]);
    assert!(success, "init must be idempotent: {}", stderr);
}
