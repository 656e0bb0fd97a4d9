//! Manuscript analysis HTTP server.
//!
//! A thin JSON layer over the analysis pipeline: uploads come in as
//! multipart forms, reports go out as JSON. Analysis itself never touches
//! disk; persistence happens only when the request asks for it.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/analyze` | Upload a manuscript, get back its report |
//! | `GET`  | `/reports/{id}` | Fetch a previously saved report |
//! | `GET`  | `/health` | Health check (version + storage paths) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "payload_too_large", "message": "file too large: ..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `unsupported_format` (400),
//! `payload_too_large` (413), `extraction_failed` (422), `not_found` (404),
//! `internal` (500).
//!
//! # CORS
//!
//! Governed by `[server].cors_origins`. A literal `"*"` permits any origin;
//! otherwise the listed origins are allowed verbatim. Methods and headers
//! are always unrestricted.

use axum::{
    extract::{multipart, DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::{Config, UploadError};
use crate::decode::DecodeError;
use crate::pipeline::{self, Document};
use crate::report::Report;
use crate::store;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

/// Starts the analysis HTTP server.
///
/// Binds to `[server].bind`, prints the bound address on stdout once the
/// listener is ready, and serves until the process is terminated. Storage
/// directories are created up front so opt-in persistence cannot fail on a
/// missing directory later.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    store::ensure_dirs(&config.storage)?;

    let cors = cors_layer(&config.server.cors_origins)?;
    // Cap request bodies a little above the manuscript limit so multipart
    // framing does not eat into it. The precise check runs per file.
    let body_limit = config.limits.max_upload_bytes() as usize + 64 * 1024;

    let state = AppState {
        config: Arc::new(config.clone()),
    };

    let app = Router::new()
        .route("/analyze", post(handle_analyze))
        .route("/reports/{id}", get(handle_get_report))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    let addr = listener.local_addr()?;
    println!("analysis server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|origin| origin == "*") {
        return Ok(layer.allow_origin(Any));
    }
    let parsed = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| anyhow::anyhow!("Invalid CORS origin: {origin}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(parsed)))
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

/// Constructs a 400 error for extensions outside the allow-list and formats
/// the decoder does not know.
fn unsupported_format(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "unsupported_format".to_string(),
        message: message.into(),
    }
}

/// Constructs a 413 Payload Too Large error.
fn payload_too_large(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::PAYLOAD_TOO_LARGE,
        code: "payload_too_large".to_string(),
        message: message.into(),
    }
}

/// Constructs a 422 error for files that matched a known format but could
/// not be read as one.
fn extraction_failed(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::UNPROCESSABLE_ENTITY,
        code: "extraction_failed".to_string(),
        message: message.into(),
    }
}

/// Constructs a 404 Not Found error.
fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

/// Constructs a 500 Internal Server Error.
fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> AppError {
        match &err {
            UploadError::DisallowedExtension(_) => unsupported_format(err.to_string()),
            UploadError::TooLarge { .. } => payload_too_large(err.to_string()),
        }
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> AppError {
        match &err {
            DecodeError::UnsupportedFormat(_) => unsupported_format(err.to_string()),
            DecodeError::Extraction { .. } | DecodeError::Encoding => {
                extraction_failed(err.to_string())
            }
        }
    }
}

impl From<multipart::MultipartError> for AppError {
    fn from(err: multipart::MultipartError) -> AppError {
        // A body-limit overrun surfaces here as a stream error carrying 413.
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            payload_too_large("request body exceeds the upload limit")
        } else {
            bad_request(format!("malformed multipart body: {}", err.body_text()))
        }
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
    manuscript_dir: String,
    report_dir: String,
}

/// Handler for `GET /health`.
async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        manuscript_dir: state.config.storage.manuscript_dir.display().to_string(),
        report_dir: state.config.storage.report_dir.display().to_string(),
    })
}

// ============ POST /analyze ============

/// JSON response body for `POST /analyze`: the report itself, plus
/// persistence outcomes when they were requested.
#[derive(Serialize)]
struct AnalyzeResponse {
    #[serde(flatten)]
    report: Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    persisted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report_saved: Option<bool>,
}

/// Handler for `POST /analyze`.
///
/// Accepts a multipart form with a required `file` part and optional
/// boolean `persist` and `save_report` parts. Extension and size checks run
/// before any decoding. Persistence failures never fail the analysis: the
/// report is already computed, so the response carries `persisted: false` or
/// `report_saved: false` and the cause goes to the log.
async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut persist = false;
    let mut save_report = false;

    while let Some(field) = multipart.next_field().await? {
        match field.name().unwrap_or_default() {
            "file" => {
                let filename = field.file_name().unwrap_or("untitled").to_string();
                let data = field.bytes().await?;
                file = Some((filename, data.to_vec()));
            }
            "persist" => persist = parse_flag(&read_text(field).await?)?,
            "save_report" => save_report = parse_flag(&read_text(field).await?)?,
            _ => {}
        }
    }

    let (filename, data) = file.ok_or_else(|| bad_request("missing 'file' field"))?;

    state.config.limits.check_extension(&filename)?;
    state.config.limits.check_size(data.len() as u64)?;

    let document = Document::new(filename, data);
    let analysis = pipeline::analyze(&document)?;

    tracing::info!(
        filename = %document.filename,
        bytes = document.bytes.len(),
        total = analysis.report.total_score,
        elapsed_ms = analysis.report.processing_ms,
        "manuscript analyzed"
    );

    let mut persisted = None;
    let mut report_saved = None;

    if persist {
        persisted = Some(
            match store::save_manuscript(
                &state.config.storage,
                &document.filename,
                &document.bytes,
                &document.content_hash,
                chrono::Utc::now(),
            ) {
                Ok(path) => {
                    tracing::info!(path = %path.display(), "manuscript persisted");
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "manuscript persistence failed");
                    false
                }
            },
        );
    }

    if save_report {
        report_saved = Some(
            match store::save_report(&state.config.storage, &analysis.report) {
                Ok(path) => {
                    tracing::info!(path = %path.display(), "report saved");
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "report save failed");
                    false
                }
            },
        );
    }

    Ok(Json(AnalyzeResponse {
        report: analysis.report,
        persisted,
        report_saved,
    }))
}

async fn read_text(field: multipart::Field<'_>) -> Result<String, AppError> {
    Ok(field.text().await?)
}

/// Parses the lenient boolean grammar used by form fields. An empty value
/// reads as `false`, matching an absent field.
fn parse_flag(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(bad_request(format!("not a boolean: {other:?}"))),
    }
}

// ============ GET /reports/{id} ============

/// Handler for `GET /reports/{id}`.
///
/// Serves a report previously written by `save_report`. Malformed ids read
/// as absent, so both cases surface as 404.
async fn handle_get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Report>, AppError> {
    match store::load_report(&state.config.storage, &id) {
        Ok(Some(report)) => Ok(Json(report)),
        Ok(None) => Err(not_found(format!("no report with id: {id}"))),
        Err(e) => Err(internal(format!("failed to load report: {e:#}"))),
    }
}
