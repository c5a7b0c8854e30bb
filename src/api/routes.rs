// file: src/api/routes.rs
// description: router assembly and the HTTP server loop
// reference: https://docs.rs/axum

use crate::api::handlers::{self, AppState};
use crate::error::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub fn create_router(state: AppState, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/api/query", post(handlers::query))
        .route("/api/query/upload", post(handlers::query_upload))
        .route("/api/documents/search", post(handlers::search_documents))
        .route("/api/tools", get(handlers::list_tools))
        .layer(from_fn_with_state(state.clone(), handlers::require_auth));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(router: Router, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::orchestrator::LegalOrchestrator;
    use crate::tools::ToolRegistry;
    use crate::tools::testing::StubServer;
    use crate::utils::HealthCheck;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct DownServer;

    #[async_trait]
    impl crate::tools::ToolServer for DownServer {
        fn name(&self) -> &'static str {
            "elevenlabs"
        }

        fn tools(&self) -> &'static [&'static str] {
            &[]
        }

        async fn health_check(&self) -> HealthCheck {
            HealthCheck::unhealthy("elevenlabs", "no key".to_string(), Duration::ZERO)
        }

        async fn call_tool(&self, _tool: &str, _params: Value) -> crate::error::Result<Value> {
            Ok(json!({}))
        }
    }

    fn router(registry: ToolRegistry, secret: Option<&str>) -> Router {
        let mut config = Config::default_config().orchestrator;
        config.retry_backoff_ms = 1;
        let orchestrator = LegalOrchestrator::new(registry, &config);
        create_router(
            AppState::new(Arc::new(orchestrator), secret.map(str::to_string)),
            1024 * 1024,
        )
    }

    fn rag_registry() -> ToolRegistry {
        ToolRegistry::new().with_server(StubServer::returning(
            "rag",
            json!({"success": true, "results": [], "confidence": 0.42, "sources": []}),
        ))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_ok_and_unavailable() {
        let response = router(rag_registry(), None)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["overall_status"], "healthy");

        let response = router(rag_registry().with_server(Arc::new(DownServer)), None)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["overall_status"], "unhealthy");
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let response = router(rag_registry(), None)
            .oneshot(
                Request::post("/api/documents/search")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query": "rent", "top_k": 2}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["confidence"], 0.42);
    }

    #[tokio::test]
    async fn test_bearer_auth() {
        let app = router(rag_registry(), Some("s3cret"));

        let response = app
            .clone()
            .oneshot(Request::get("/api/tools").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(
                Request::get("/api/tools")
                    .header("authorization", "Bearer s3cret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"rag": ["stub"]}));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_query_with_empty_text_reports_failure() {
        let response = router(rag_registry(), None)
            .oneshot(
                Request::post("/api/query")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query": ""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["summary"], "An error occurred while processing your request.");
    }

    #[tokio::test]
    async fn test_upload_routes_documents_to_parser() {
        let parser = StubServer::returning("parser", json!({"success": true, "facts": []}));
        let registry = rag_registry().with_server(parser.clone());

        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"query\"\r\n\r\nCan my landlord keep the deposit?\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"document\"; filename=\"lease.txt\"\r\nContent-Type: text/plain\r\n\r\nDeposit Rs. 50,000\r\n\
             --{b}--\r\n",
            b = boundary
        );

        let response = router(registry, None)
            .oneshot(
                Request::post("/api/query/upload")
                    .header("content-type", format!("multipart/form-data; boundary={}", boundary))
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let received = parser.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].1["documents"][0]["name"], "lease.txt");
        assert_eq!(received[0].1["documents"][0]["text"], "Deposit Rs. 50,000");
    }

    #[tokio::test]
    async fn test_upload_without_query_is_bad_request() {
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"language\"\r\n\r\nTamil\r\n--{b}--\r\n",
            b = boundary
        );

        let response = router(rag_registry(), None)
            .oneshot(
                Request::post("/api/query/upload")
                    .header("content-type", format!("multipart/form-data; boundary={}", boundary))
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
