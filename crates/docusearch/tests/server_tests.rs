//! HTTP surface tests driven through the router without a socket

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use common::{extractor, test_config, HashEmbedder, RecordingGenerator};
use docusearch::server::{state::AppState, DocuSearchServer};

const BOUNDARY: &str = "docusearch-test-boundary";

fn state(dir: &TempDir) -> AppState {
    AppState::new(
        test_config(dir.path()),
        extractor(),
        Arc::new(HashEmbedder),
        Arc::new(RecordingGenerator::default()),
    )
}

fn router(dir: &TempDir) -> Router {
    DocuSearchServer::with_state(state(dir)).build_router()
}

fn multipart(files: &[(&str, &[u8])]) -> Body {
    let mut body = Vec::new();
    for (filename, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload(uri: &str, files: &[(&str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(multipart(files))
        .unwrap()
}

const PDF: &[u8] = b"%PDF-1.4 test";

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir);

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_status_of_fresh_workspace() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir);

    let (status, body) = send(&app, get("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["workspace"], "default");
    assert_eq!(body["initialized"], false);
    assert_eq!(body["total_chunks"], 0);
    assert_eq!(body["files_loaded"], json!([]));
}

#[tokio::test]
async fn test_query_before_upload_is_rejected() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir);

    let (status, body) = send(&app, post_json("/api/query", json!({"question": "what is attn?"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Upload files first");
}

#[tokio::test]
async fn test_invalid_requests_are_unprocessable() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir);

    let (status, _) = send(&app, get("/api/status?workspace=../etc")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, post_json("/api/query", json!({"question": "hi"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app,
        post_json("/api/query", json!({"question": "what is attn?", "num_sources": 11})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, upload("/api/upload", &[("notes.txt", PDF)])).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, upload("/api/upload", &[("fake.pdf", b"plain text")])).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_upload_query_remove_flow() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir);

    let (status, body) = send(&app, upload("/api/upload", &[("paper.pdf", PDF)])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["processed_files"], json!(["paper.pdf"]));
    assert_eq!(body["total_chunks"], 3);
    assert!(body.get("errors").is_none());

    let (_, body) = send(&app, get("/api/status")).await;
    assert_eq!(body["initialized"], true);
    assert_eq!(body["files_loaded"], json!(["paper.pdf"]));

    let (status, body) = send(
        &app,
        post_json("/api/query", json!({"question": "what is attn?", "num_sources": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], RecordingGenerator::ANSWER);
    assert_eq!(body["sources"][0]["paper"], "paper");
    assert_eq!(body["sources"][0]["page"], 1);

    let (status, body) = send(&app, post_json("/api/remove-file", json!({"filename": "paper.pdf"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed_chunks"], 3);

    let (status, _) = send(&app, post_json("/api/remove-file", json!({"filename": "paper.pdf"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_partial_upload_reports_failed_files() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir);

    let (status, body) = send(
        &app,
        upload("/api/upload", &[("paper.pdf", PDF), ("broken.pdf", PDF)]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed_files"], json!(["paper.pdf"]));
    assert_eq!(body["errors"], json!(["broken.pdf: Failed to process"]));
}

#[tokio::test]
async fn test_workspaces_are_isolated() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir);

    let (status, _) = send(&app, upload("/api/upload?workspace=alpha", &[("paper.pdf", PDF)])).await;
    assert_eq!(status, StatusCode::OK);

    let (_, alpha) = send(&app, get("/api/status?workspace=alpha")).await;
    let (_, beta) = send(&app, get("/api/status?workspace=beta")).await;
    assert_eq!(alpha["total_chunks"], 3);
    assert_eq!(beta["initialized"], false);

    let (status, _) = send(&app, post_json("/api/reset?workspace=alpha", json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, alpha) = send(&app, get("/api/status?workspace=alpha")).await;
    assert_eq!(alpha["initialized"], false);
}

#[tokio::test]
async fn test_remove_before_upload_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let app = router(&dir);

    let (status, body) = send(&app, post_json("/api/remove-file", json!({"filename": "paper.pdf"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Upload files first");
}

#[tokio::test(start_paused = true)]
async fn test_query_waiting_on_lock_times_out() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.server.query_timeout_secs = 5;
    let state = AppState::new(
        config,
        extractor(),
        Arc::new(HashEmbedder),
        Arc::new(RecordingGenerator::default()),
    );
    let app = DocuSearchServer::with_state(state.clone()).build_router();

    // Stands in for a long upload holding the workspace
    let engine = state.engine("default").unwrap();
    let _writer = engine.write().await;

    let (status, body) = send(&app, post_json("/api/query", json!({"question": "what is attn?"}))).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["message"], "Query timed out");
}
