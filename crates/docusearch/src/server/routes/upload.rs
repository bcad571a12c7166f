//! Upload endpoint: validate, ingest and index PDF files

use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::ingestion::validate_upload;
use crate::server::state::AppState;
use crate::types::{Chunk, UploadResponse, WorkspaceParams};

/// One validated file from the request
struct UploadedFile {
    original_name: String,
    filename: String,
    data: Bytes,
}

fn multipart_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge("Total upload exceeds the size limit".to_string())
    } else {
        Error::validation(format!("Malformed multipart request: {}", e.body_text()))
    }
}

/// POST /api/upload - Upload and index PDF files
///
/// Any validation failure rejects the whole request. Files that pass
/// validation but cannot be processed are reported in `errors` while the
/// rest are still indexed.
pub async fn upload_files(
    State(state): State<AppState>,
    Query(params): Query<WorkspaceParams>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let workspace = params.name()?;
    let limits = &state.config().server;
    let start = Instant::now();

    let mut files = Vec::new();
    let mut total_size = 0usize;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(original_name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };

        let data = field.bytes().await.map_err(multipart_error)?;
        total_size += data.len();
        if total_size > limits.max_total_upload {
            return Err(Error::PayloadTooLarge(format!(
                "Total upload too large. Maximum: {}MB",
                limits.max_total_upload / (1024 * 1024)
            )));
        }

        let filename = validate_upload(&original_name, &data, limits.max_file_size)?;
        files.push(UploadedFile {
            original_name,
            filename,
            data,
        });
    }

    if files.is_empty() {
        return Err(Error::validation("No files provided"));
    }

    let engine = state.engine(workspace)?;
    let ingest_timeout = Duration::from_secs(limits.ingest_timeout_secs);

    let response = timeout(ingest_timeout, async {
        let mut engine = engine.write().await;

        let mut all_chunks: Vec<Chunk> = Vec::new();
        let mut processed_files = Vec::new();
        let mut errors = Vec::new();

        for file in files {
            match engine.ingest_document(file.data, &file.filename).await {
                Ok(ingested) => {
                    let document = &ingested.document;
                    tracing::info!(
                        "Ingested {} ({} pages, {} bytes, sha256 {}): {} chunks",
                        document.filename,
                        document.page_count,
                        document.file_size,
                        document.content_hash,
                        ingested.chunks.len()
                    );
                    all_chunks.extend(ingested.chunks);
                    processed_files.push(file.filename);
                }
                Err(e) => {
                    tracing::error!("Error processing {}: {}", file.original_name, e);
                    errors.push(format!("{}: Failed to process", file.original_name));
                }
            }
        }

        if !all_chunks.is_empty() {
            let report = engine.index(&all_chunks).await?;
            tracing::info!(
                "Indexed {} chunks into workspace '{}' ({} total)",
                report.indexed_chunks,
                workspace,
                report.total_chunks
            );
        }

        Ok::<_, Error>(UploadResponse {
            status: "success".to_string(),
            processed_files,
            total_chunks: all_chunks.len(),
            errors: if errors.is_empty() { None } else { Some(errors) },
        })
    })
    .await
    .map_err(|_| Error::Timeout("Document processing timed out".to_string()))??;

    tracing::info!(
        "Upload finished in {:?}: {} files, {} chunks",
        start.elapsed(),
        response.processed_files.len(),
        response.total_chunks
    );

    Ok(Json(response))
}
