//! HTTP handlers.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::{Deserialize, Serialize};
use zeroshot_core::{Classification, ScoredLabel};

use super::error::{ApiError, WarningBody};
use super::page::ExampleView;
use super::AppState;

/// Body of a classification response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    /// Highest-scoring label, if any
    pub label: Option<String>,
    /// Top-k labels, best first
    pub confidences: Vec<ScoredLabel>,
    /// Every label in input order
    pub scores: Vec<ScoredLabel>,
    pub warnings: Vec<WarningBody>,
}

impl ClassifyResponse {
    pub fn new(outcome: &Classification, top_k: usize) -> Self {
        let confidences = outcome.result.top_k(top_k);
        Self {
            label: confidences.first().map(|entry| entry.label.clone()),
            confidences,
            scores: outcome.result.entries().to_vec(),
            warnings: outcome.warnings.iter().copied().map(WarningBody::from).collect(),
        }
    }
}

/// `GET /`
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    state
        .page
        .render(&state.interface, state.gallery.examples())
        .map(Html)
        .map_err(|e| ApiError::Internal(format!("Failed to render page: {e}")))
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": zeroshot_core::VERSION,
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

/// `POST /api/classify`
///
/// Multipart fields: `image` (file), `labels` (text) and an optional `top_k`.
/// An image field with no content counts as no image.
pub async fn classify(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut labels: Option<String> = None;
    let mut top_k = state.interface.num_top_classes;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    upload = Some((file_name, bytes.to_vec()));
                }
            }
            Some("labels") => labels = Some(field.text().await?),
            Some("top_k") => {
                let text = field.text().await?;
                match text.trim().parse() {
                    Ok(k) => top_k = k,
                    Err(_) => tracing::debug!("Ignoring invalid top_k {:?}", text),
                }
            }
            other => tracing::debug!("Ignoring multipart field {:?}", other),
        }
    }

    let image = match upload {
        Some((file_name, bytes)) => Some(state.decoder.decode_bytes(bytes, &file_name).await?.image),
        None => None,
    };

    let classifier = state.classifier.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        classifier.classify(image.as_ref(), labels.as_deref())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Classification task failed: {e}")))?
    .map_err(|error| ApiError::Classify {
        error,
        verbose: state.debug,
    })?;

    Ok(Json(ClassifyResponse::new(&outcome, top_k)))
}

/// `GET /api/examples`
pub async fn list_examples(State(state): State<Arc<AppState>>) -> Json<Vec<ExampleView>> {
    Json(
        state
            .gallery
            .examples()
            .iter()
            .map(ExampleView::from)
            .collect(),
    )
}

/// `GET /api/examples/{index}`
pub async fn example_result(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let outcome = state
        .gallery
        .classify(index, &state.classifier, &state.decoder)
        .await
        .map_err(|e| ApiError::from_example(e, state.debug))?
        .ok_or(ApiError::ExampleNotFound(index))?;

    Ok(Json(ClassifyResponse::new(
        &outcome,
        state.interface.num_top_classes,
    )))
}

/// `GET /examples/{index}/image`
pub async fn example_image(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<impl IntoResponse, ApiError> {
    let example = state
        .gallery
        .get(index)
        .ok_or(ApiError::ExampleNotFound(index))?;

    let bytes = tokio::fs::read(&example.image_path).await.map_err(|e| {
        ApiError::ExampleUnavailable(format!("{}: {}", example.image_path.display(), e))
    })?;

    Ok(([(header::CONTENT_TYPE, content_type(&example.image_path))], bytes))
}

fn content_type(path: &FsPath) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}
