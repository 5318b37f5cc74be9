use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::extract;
use crate::retrieval::chunking::Chunker;
use crate::retrieval::index::VectorIndex;
use crate::AppState;

#[derive(Debug, Serialize)]
struct UploadResponse {
    message: String,
    filename: String,
}

/// POST /upload
///
/// Accepts a multipart PDF, runs the ingestion pipeline (extract, chunk,
/// embed, index), and atomically installs the result as the session's
/// active index. The scratch file is removed whether or not ingestion
/// succeeds, and a failed ingestion leaves any previous index untouched.
pub async fn upload_file(
    state: web::Data<AppState>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let (filename, data) = read_file_field(payload, state.config.max_upload_size).await?;

    if data.is_empty() {
        return Err(AppError::BadRequest("No file selected.".to_string()));
    }
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(AppError::UnsupportedMediaType(
            "Only PDF files are supported.".to_string(),
        ));
    }

    let filepath = scratch_path(&state.config.upload_dir, &filename);
    std::fs::write(&filepath, &data)?;

    let result = ingest(&state, &filepath).await;

    // Clean up the scratch file regardless of outcome.
    if let Err(e) = std::fs::remove_file(&filepath) {
        warn!("Failed to remove uploaded file {:?}: {}", filepath, e);
    }

    let chunk_count = result?;
    info!("Indexed '{}' into {} chunks", filename, chunk_count);

    Ok(HttpResponse::Ok().json(UploadResponse {
        message: format!("'{filename}' processed successfully."),
        filename,
    }))
}

/// Extract, chunk, embed, and index the file at `path`, then swap the new
/// index into the session. Returns the number of indexed chunks.
async fn ingest(state: &AppState, path: &Path) -> AppResult<usize> {
    let document = extract::extract_pdf(path)?;

    let chunker = Chunker::new(state.config.chunk_size, state.config.chunk_overlap);
    let chunks = chunker.split(&document);

    let index = VectorIndex::build(chunks, state.embeddings.as_ref()).await?;
    let chunk_count = index.len();

    // Only a fully built index ever reaches the session slot.
    state.session.set(Arc::new(index));

    Ok(chunk_count)
}

/// Pull the `file` field out of the multipart stream, bounding the bytes
/// read by `max_size`. Errors with the user-facing messages for a missing
/// field or an empty filename. A body with no parts at all (the stream
/// errors before yielding a single field) also counts as no file provided.
async fn read_file_field(
    mut payload: Multipart,
    max_size: usize,
) -> AppResult<(String, Vec<u8>)> {
    let mut saw_field = false;

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(e) if !saw_field => {
                warn!("Empty or malformed multipart body: {}", e);
                return Err(AppError::BadRequest(
                    "No file provided in the request.".to_string(),
                ));
            }
            Err(e) => {
                return Err(AppError::BadRequest(format!("Multipart error: {e}")));
            }
        };
        saw_field = true;

        let content_disposition = field.content_disposition();
        let field_name = content_disposition
            .as_ref()
            .and_then(|cd| cd.get_name())
            .unwrap_or("");
        if field_name != "file" {
            continue;
        }

        let filename = content_disposition
            .as_ref()
            .and_then(|cd| cd.get_filename())
            .map(sanitize_filename)
            .unwrap_or_default();
        if filename.is_empty() {
            return Err(AppError::BadRequest("No file selected.".to_string()));
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?;
            if data.len() + chunk.len() > max_size {
                return Err(AppError::PayloadTooLarge(format!(
                    "file exceeds the {max_size} byte upload limit"
                )));
            }
            data.extend_from_slice(&chunk);
        }

        return Ok((filename, data));
    }

    Err(AppError::BadRequest(
        "No file provided in the request.".to_string(),
    ))
}

/// Scratch path for one ingestion. The name is prefixed with a fresh UUID
/// so concurrent uploads of the same filename never share a path, and one
/// request's cleanup cannot remove another's in-flight file.
fn scratch_path(upload_dir: &str, filename: &str) -> PathBuf {
    PathBuf::from(upload_dir).join(format!("{}-{filename}", uuid::Uuid::new_v4()))
}

/// Keep only the final path component so a crafted filename cannot escape
/// the upload directory.
fn sanitize_filename(raw: &str) -> String {
    Path::new(raw)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
