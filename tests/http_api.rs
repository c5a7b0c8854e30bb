// file: tests/http_api.rs
// description: router tests against a fully configured orchestrator
// reference: https://docs.rs/axum

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tamilguardian::api::{AppState, create_router};
use tamilguardian::{Config, LegalOrchestrator};
use tower::ServiceExt;

async fn app(secret: Option<&str>) -> (axum::Router, tempfile::TempDir) {
    let db = tempfile::tempdir().unwrap();
    let mut config = Config::default_config();
    config.rag.uri = db.path().to_string_lossy().to_string();
    config.rag.nebius_api_key = None;
    config.llm.api_key = None;
    config.tts.api_key = None;
    config.search.api_key = None;

    let orchestrator = LegalOrchestrator::from_config(&config).await.unwrap();
    let state = AppState::new(Arc::new(orchestrator), secret.map(str::to_string));
    (create_router(state, 4 * 1024 * 1024), db)
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn tools_listing_names_every_server() {
    let (app, _db) = app(None).await;

    let response = app
        .oneshot(Request::get("/api/tools").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["rag"], serde_json::json!(["search", "index_document", "list_documents"]));
    assert_eq!(body["parser"], serde_json::json!(["parse_documents"]));
    assert_eq!(body["llm"], serde_json::json!(["reason", "generate"]));
    assert!(body["elevenlabs"].is_array());
    assert!(body["websearch"].is_array());
}

#[tokio::test]
async fn search_hits_seeded_statutes() {
    let (app, _db) = app(None).await;

    let response = app
        .oneshot(
            Request::post("/api/documents/search")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"query": "tenant rent deposit", "top_k": 2}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    let results = body["results"].as_array().unwrap();
    assert!(!results.is_empty() && results.len() <= 2);
}

#[tokio::test]
async fn health_is_unavailable_without_credentials() {
    let (app, _db) = app(Some("token")).await;

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(response).await;
    assert_eq!(body["overall_status"], "unhealthy");
    assert_eq!(body["checks"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn query_requires_bearer_when_secret_set() {
    let (app, _db) = app(Some("token")).await;

    let response = app
        .oneshot(
            Request::post("/api/query")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"query": "rent"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Missing bearer token");
}
