//! Route handlers.

use crate::error::WebError;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use pf_core::ingest::{sniff_content_type, BatchReport, IngestError, UploadItem};
use pf_core::store::{allowed_extension, StoreError};
use pf_protocol::photo_models::{
    BatchOutcome, DeleteRequest, DeleteResponse, PhotoInfo, UploadSummary,
};
use std::sync::Arc;

/// Multipart field carrying the uploaded files.
const PHOTOS_FIELD: &str = "photos";

/// `GET /api/photos`: every stored photo, newest first.
pub async fn list_photos(State(state): State<Arc<AppState>>) -> Result<Json<Vec<PhotoInfo>>, WebError> {
    let store = state.store.clone();
    let photos: Vec<PhotoInfo> = tokio::task::spawn_blocking(move || {
        store.list().iter().map(|entry| entry.to_info()).collect()
    })
    .await?;
    Ok(Json(photos))
}

/// A `photos` part, either read in full or already rejected.
enum Received {
    Item(UploadItem),
    Rejected(IngestError),
}

/// `POST /upload_photo`: ingest every `photos` part independently.
pub async fn upload_photo(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadSummary>), WebError> {
    let mut received = Vec::new();

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(PHOTOS_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();

        let mut bytes = Vec::new();
        let mut too_large = false;
        while let Some(chunk) = field.chunk().await? {
            if (bytes.len() + chunk.len()) as u64 > state.max_file_bytes {
                too_large = true;
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        // An empty part with no name is a file input left blank.
        if filename.is_empty() && bytes.is_empty() {
            continue;
        }

        received.push(if too_large {
            Received::Rejected(IngestError::TooLarge {
                filename,
                limit: state.max_file_bytes,
            })
        } else {
            Received::Item(UploadItem::new(filename, bytes))
        });
    }

    let pipeline = state.pipeline.clone();
    let report = tokio::task::spawn_blocking(move || {
        let mut report = BatchReport::default();
        for entry in received {
            match entry {
                Received::Item(item) => report.record(pipeline.ingest(&item.bytes, &item.filename)),
                Received::Rejected(err) => report.record(Err(err)),
            }
        }
        report
    })
    .await?;

    for err in &report.rejected {
        tracing::warn!("Upload rejected: {err}");
    }

    let summary = report.to_summary();
    let status = match summary.outcome {
        BatchOutcome::AllStored | BatchOutcome::Partial => StatusCode::OK,
        BatchOutcome::Empty | BatchOutcome::NoneStored => StatusCode::BAD_REQUEST,
    };
    Ok((status, Json(summary)))
}

/// `POST /delete_photo`: remove one photo by its bare name.
pub async fn delete_photo(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> (StatusCode, Json<DeleteResponse>) {
    let invalid = || {
        (
            StatusCode::BAD_REQUEST,
            Json(DeleteResponse::failed("Invalid filename")),
        )
    };

    let Ok(Json(request)) = payload else {
        return invalid();
    };
    let Some(filename) = request.filename.filter(|name| !name.is_empty()) else {
        return invalid();
    };

    match state.store.delete(&filename) {
        Ok(()) => (
            StatusCode::OK,
            Json(DeleteResponse::ok("Photo deleted successfully")),
        ),
        Err(StoreError::InvalidTarget(_)) => invalid(),
        Err(StoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(DeleteResponse::failed("Photo not found")),
        ),
        Err(err @ StoreError::FileSystem { .. }) => {
            tracing::error!("Delete of {filename} failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DeleteResponse::failed(format!("Error deleting photo: {err}"))),
            )
        }
    }
}

/// `GET /uploads/{filename}`: raw bytes of one stored photo.
///
/// `Content-Type` follows the bytes; the extension is only a fallback.
pub async fn serve_upload(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, WebError> {
    let path = state
        .store
        .resolve(&filename)
        .map_err(|_| WebError::BadRequest("Invalid filename".to_string()))?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(WebError::NotFound("Photo not found".to_string()));
        }
        Err(e) => return Err(WebError::Internal(format!("{}: {e}", path.display()))),
    };

    let content_type = sniff_content_type(&bytes)
        .or_else(|| allowed_extension(&filename).map(|ext| content_type_for(&ext)))
        .unwrap_or("application/octet-stream");

    Ok(([(header::CONTENT_TYPE, content_type)], Body::from(bytes)).into_response())
}

fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
