//! Query endpoint: grounded answers with numbered sources

use axum::{
    extract::{Query, State},
    Json,
};
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResult, WorkspaceParams};

/// POST /api/query - Answer a question from the indexed documents
pub async fn query_documents(
    State(state): State<AppState>,
    Query(params): Query<WorkspaceParams>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResult>> {
    let workspace = params.name()?;
    let request = request.validate()?;
    let start = Instant::now();

    tracing::info!("Query in '{}': \"{}\"", workspace, request.question);

    let engine = state.engine(workspace)?;

    // Waiting for an upload to release the lock counts against the timeout
    let query_timeout = Duration::from_secs(state.config().server.query_timeout_secs);
    let result = timeout(query_timeout, async {
        let engine = engine.read().await;
        engine.answer(&request.question, request.num_sources).await
    })
    .await
    .map_err(|_| Error::Timeout("Query timed out".to_string()))??;

    tracing::info!(
        "Answered with {} sources in {:?}",
        result.num_sources,
        start.elapsed()
    );

    Ok(Json(result))
}
