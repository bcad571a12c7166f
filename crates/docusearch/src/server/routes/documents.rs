//! Index status, file removal and reset endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{RemoveFileRequest, RemoveFileResponse, StatusResponse, WorkspaceParams};

/// GET /api/status - Index status for a workspace
pub async fn status(
    State(state): State<AppState>,
    Query(params): Query<WorkspaceParams>,
) -> Result<Json<StatusResponse>> {
    let workspace = params.name()?;
    let engine = state.engine(workspace)?;
    let stats = engine.read().await.stats();

    Ok(Json(StatusResponse::new(workspace, stats)))
}

/// POST /api/remove-file - Remove one file's chunks from the index
pub async fn remove_file(
    State(state): State<AppState>,
    Query(params): Query<WorkspaceParams>,
    Json(request): Json<RemoveFileRequest>,
) -> Result<Json<RemoveFileResponse>> {
    let workspace = params.name()?;
    let request = request.validate()?;

    let engine = state.engine(workspace)?;
    let mut engine = engine.write().await;
    if !engine.is_indexed() {
        return Err(Error::NotIndexed);
    }

    let result = engine.remove_document(&request.filename)?;
    Ok(Json(RemoveFileResponse::new(&request.filename, result)))
}

/// POST /api/reset - Clear the workspace index
pub async fn reset(
    State(state): State<AppState>,
    Query(params): Query<WorkspaceParams>,
) -> Result<Json<Value>> {
    let workspace = params.name()?;
    let engine = state.engine(workspace)?;
    engine.write().await.reset();

    tracing::info!("Workspace '{}' reset", workspace);
    Ok(Json(json!({
        "status": "success",
        "message": "System reset"
    })))
}
