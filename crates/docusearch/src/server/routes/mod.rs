//! API routes for the question-answering server

pub mod documents;
pub mod query;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_total_upload: usize) -> Router<AppState> {
    Router::new()
        // Ingestion - with larger body limit for file uploads
        .route(
            "/upload",
            post(upload::upload_files).layer(DefaultBodyLimit::max(max_total_upload)),
        )
        // Question answering
        .route("/query", post(query::query_documents))
        // Index management
        .route("/status", get(documents::status))
        .route("/remove-file", post(documents::remove_file))
        .route("/reset", post(documents::reset))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "docusearch",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Question answering over uploaded PDF papers with numbered source citations",
        "endpoints": {
            "POST /api/upload": "Upload one or more PDF files (multipart field 'files')",
            "POST /api/query": "Ask a question; answer cites [Source N]",
            "GET /api/status": "Index status and loaded files",
            "POST /api/remove-file": "Remove one file from the index",
            "POST /api/reset": "Clear the index"
        },
        "workspaces": "Every /api route accepts ?workspace=<name> (default: 'default')"
    }))
}
