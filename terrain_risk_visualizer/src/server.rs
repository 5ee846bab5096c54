use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use base64::{Engine as _, engine::general_purpose};
use terrain_risk::AnalysisReport;
use terrain_risk::core_modules::image_source::decode_image;
use terrain_risk::pipeline::{analyze_bytes, analyze_image};

use crate::ServerConfig;
use crate::chart;
use crate::page::{self, ResultView};
use crate::summary::AnalysisSummary;
use crate::upload::{self, UploadError, UploadForm, sanitize_filename};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(config: ServerConfig) -> reqwest::Result<Self> {
        let client = upload::http_client(config.fetch_timeout)?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload))
        .route("/uploads/:name", get(serve_upload))
        .route("/api/analyze", post(api_analyze))
        .route("/healthz", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Binds the listener and serves the router on a background task.
pub async fn start_server(cfg: ServerConfig) -> anyhow::Result<tokio::task::JoinHandle<()>> {
    tokio::fs::create_dir_all(&cfg.upload_dir).await?;

    let bind_addr = cfg.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        "Visualizer server listening on http://{} (uploads in {})",
        bind_addr,
        cfg.upload_dir.display()
    );

    let app = router(AppState::new(cfg)?);
    let server = tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, app).await {
            tracing::error!(%error, "server stopped");
        }
    });

    Ok(server)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(page::index_page(&state.config.creator))
}

async fn upload(State(state): State<AppState>, multipart: Multipart) -> Result<Html<String>, UploadError> {
    let form = UploadForm::read(multipart).await?;
    let acquired = upload::acquire(&state.client, form, state.config.max_upload_bytes).await?;

    let bytes = acquired.bytes.clone();
    let (report, histogram_data) = tokio::task::spawn_blocking(move || render_analysis(&bytes)).await??;

    upload::store(&state.config.upload_dir, &acquired).await?;
    tracing::info!(
        filename = %acquired.filename,
        width = report.width,
        height = report.height,
        risks = report.found_risks().len(),
        "analysed upload"
    );

    let summary = AnalysisSummary::from(&report);
    let image_path = format!("/uploads/{}", acquired.filename);
    Ok(Html(page::result_page(&ResultView {
        filename: &acquired.filename,
        image_path: &image_path,
        summary: &summary,
        histogram_png_base64: &histogram_data,
    })))
}

/// Decodes, analyses and charts one image; runs off the async executor.
fn render_analysis(bytes: &[u8]) -> Result<(AnalysisReport, String), UploadError> {
    let image = decode_image(bytes)?;
    let report = analyze_image(&image)?;
    let png = chart::histogram_png(&report.histogram)?;
    Ok((report, general_purpose::STANDARD.encode(png)))
}

async fn serve_upload(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let Some(name) = sanitize_filename(&name) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let path = state.config.upload_dir.join(&name);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = image::ImageFormat::from_path(&path)
                .map(|format| format.to_mime_type())
                .unwrap_or("application/octet-stream");
            ([(header::CONTENT_TYPE, mime)], bytes).into_response()
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn api_analyze(body: Bytes) -> Response {
    let outcome = tokio::task::spawn_blocking(move || analyze_bytes(&body)).await;
    match outcome {
        Ok(Ok(report)) => Json(AnalysisSummary::from(&report)).into_response(),
        Ok(Err(error)) => {
            tracing::warn!(%error, "api request rejected");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({ "error": error.to_string() })),
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!(%error, "analysis worker failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
