//! Multi-format manuscript decoding: `(filename, raw bytes)` to plain text.
//!
//! Dispatch is on the filename extension, not content sniffing: the supported
//! set is small and closed, so each format gets one explicit arm. Plain text
//! and Markdown share a decoder that detects the byte encoding heuristically
//! and substitutes U+FFFD for malformed sequences instead of failing; text
//! extraction is best-effort, never silently truncating.

use std::io::Read;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use thiserror::Error;

/// Maximum decompressed bytes read from a single ZIP entry (zip-bomb guard).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Decoding error. All variants are request-scoped and recoverable: the
/// caller maps them to a client-visible response and nothing needs rollback.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Extension is outside the closed set of decodable formats.
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    /// The format-specific parser could not produce any text.
    #[error("{format} extraction failed: {detail}")]
    Extraction { format: &'static str, detail: String },

    /// No interpretation of the bytes as text survived replacement decoding.
    #[error("file bytes could not be interpreted as text")]
    Encoding,
}

/// The closed set of decodable manuscript formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Plain text or Markdown. Also the fallback when the filename carries
    /// no extension at all.
    Text,
    Pdf,
    Docx,
}

impl Format {
    /// Resolves a format from the filename's extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Result<Format, DecodeError> {
        match extension_of(filename).as_deref() {
            None | Some("" | "txt" | "md") => Ok(Format::Text),
            Some("pdf") => Ok(Format::Pdf),
            Some("docx") => Ok(Format::Docx),
            Some(other) => Err(DecodeError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Lowercased extension after the last dot, or `None` when there is no dot.
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Decodes an uploaded manuscript to plain text.
pub fn decode(filename: &str, bytes: &[u8]) -> Result<String, DecodeError> {
    match Format::from_filename(filename)? {
        Format::Text => decode_plain(bytes),
        Format::Pdf => decode_pdf(bytes),
        Format::Docx => decode_docx(bytes),
    }
}

/// Best-effort text decoding: strict UTF-8 fast path, then BOM sniffing,
/// then a chardetng guess, decoding with replacement either way.
fn decode_plain(bytes: &[u8]) -> Result<String, DecodeError> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        // A BOM is an encoding marker, not prose; decode() below drops it too.
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        return Ok(text.to_string());
    }

    let encoding = match Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None => {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        }
    };

    // decode() strips any BOM and replaces malformed sequences with U+FFFD.
    let (text, _, _) = encoding.decode(bytes);

    // Nothing but replacement characters means no reading of the bytes as
    // text survived at all; that is an error, not a degenerate manuscript.
    if !bytes.is_empty() && text.chars().all(|c| c == '\u{FFFD}') {
        return Err(DecodeError::Encoding);
    }
    Ok(text.into_owned())
}

/// Per-page extraction joined with `\n`. A page with no extractable text
/// contributes an empty string, which is valid input downstream.
fn decode_pdf(bytes: &[u8]) -> Result<String, DecodeError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
        DecodeError::Extraction {
            format: "pdf",
            detail: e.to_string(),
        }
    })?;
    Ok(pages.join("\n"))
}

fn docx_error(detail: impl ToString) -> DecodeError {
    DecodeError::Extraction {
        format: "docx",
        detail: detail.to_string(),
    }
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, DecodeError> {
    let entry = archive.by_name(name).map_err(docx_error)?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(docx_error)?;
    if out.len() as u64 >= max_bytes {
        return Err(docx_error(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn decode_docx(bytes: &[u8]) -> Result<String, DecodeError> {
    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(docx_error)?;
    let doc_xml = read_zip_entry_bounded(&mut archive, "word/document.xml", MAX_XML_ENTRY_BYTES)?;
    paragraphs_from_document_xml(&doc_xml)
}

/// Walks `word/document.xml`, collecting `w:t` runs per `w:p` paragraph and
/// joining paragraphs with `\n`. Empty paragraphs contribute blank lines,
/// which keeps paragraph counting downstream honest about author spacing.
fn paragraphs_from_document_xml(xml: &[u8]) -> Result<String, DecodeError> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => {
                if let Ok(Event::Text(t)) = reader.read_event_into(&mut buf) {
                    current.push_str(t.unescape().unwrap_or_default().as_ref());
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"p" => {
                paragraphs.push(std::mem::take(&mut current));
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"p" => {
                paragraphs.push(String::new());
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(docx_error(e)),
            _ => {}
        }
        buf.clear();
    }
    // Runs outside any w:p are malformed but salvageable.
    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n"))
}
