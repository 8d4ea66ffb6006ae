//! HTTP upload service
//!
//! Serves the upload form, accepts multipart uploads, stores them and renders
//! the recognition result. Stored uploads are served back under `/uploads`.

pub mod pages;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::{AppConfig, ServerConfig};
use crate::error::PlateError;
use crate::storage::{allowed_file, UploadStore, UPLOADS_ROUTE};
use crate::vision::{OcrEngine, PlateLocator, PlateRecognizer, TesseractCli};

/// State shared by all request handlers
pub struct AppState {
    pub config: ServerConfig,
    pub recognizer: PlateRecognizer<Arc<dyn OcrEngine>>,
    pub store: UploadStore,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Build state backed by the Tesseract executable from `config`
    pub fn from_config(config: &AppConfig) -> Result<Self, PlateError> {
        let engine: Arc<dyn OcrEngine> = Arc::new(TesseractCli::new(config.ocr.clone()));
        Self::with_engine(config, engine)
    }

    /// Build state with a caller supplied OCR engine
    pub fn with_engine(config: &AppConfig, engine: Arc<dyn OcrEngine>) -> Result<Self, PlateError> {
        Ok(Self {
            config: config.server.clone(),
            recognizer: PlateRecognizer::new(PlateLocator::new(config.locator.clone()), engine),
            store: UploadStore::open(&config.server.upload_dir)?,
        })
    }
}

/// Build the application router
pub fn router(state: SharedState) -> Router {
    let uploads = ServeDir::new(state.store.dir());
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(home))
        .route("/upload/", post(upload))
        .route("/upload", post(upload))
        .nest_service(UPLOADS_ROUTE, uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl+C
pub async fn serve(state: SharedState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&state.config.bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

async fn home() -> Html<String> {
    Html(pages::upload_form())
}

async fn upload(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Html<String>, PlateError> {
    let (filename, bytes) = read_file_field(&mut multipart, &state.config).await?;
    let stored = state.store.save(&filename, &bytes)?;
    info!(filename = %stored.filename, size = bytes.len(), "Upload stored");

    let worker = Arc::clone(&state);
    let path = stored.path.clone();
    let recognition = tokio::task::spawn_blocking(move || worker.recognizer.recognize_file(&path))
        .await
        .map_err(|e| PlateError::Worker(e.to_string()))??;

    Ok(Html(pages::result_page(&stored.url, recognition.display_text())))
}

/// Pull the `file` part out of the multipart body.
///
/// The extension is checked against the allow-list before the part's bytes
/// are read.
async fn read_file_field(
    multipart: &mut Multipart,
    config: &ServerConfig,
) -> Result<(String, Bytes), PlateError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PlateError::Multipart(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(PlateError::MissingFile),
        };

        if !allowed_file(&filename, &config.allowed_extensions) {
            warn!(%filename, "Rejected upload with disallowed extension");
            return Err(PlateError::UnsupportedFileType(filename));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| PlateError::Multipart(e.to_string()))?;
        return Ok((filename, bytes));
    }

    Err(PlateError::MissingFile)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: &'static str,
}

impl IntoResponse for PlateError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            PlateError::UnsupportedFileType(_) => (StatusCode::BAD_REQUEST, "File type not allowed"),
            PlateError::MissingFile => (StatusCode::BAD_REQUEST, "No file uploaded"),
            PlateError::Multipart(_) => (StatusCode::BAD_REQUEST, "Malformed upload"),
            PlateError::Decode(_)
            | PlateError::Ocr(_)
            | PlateError::Io(_)
            | PlateError::Worker(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        if status.is_server_error() {
            error!("Upload failed: {}", self);
        } else {
            warn!("Upload rejected: {}", self);
        }

        (status, Json(ErrorBody { detail })).into_response()
    }
}
