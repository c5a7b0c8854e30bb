// file: src/api/handlers.rs
// description: HTTP handlers for queries, uploads, search, tool listing and health
// reference: https://docs.rs/axum

use crate::error::AssistantError;
use crate::models::{ExecutionResult, LegalQuery, UploadedDocument, UserPreferences};
use crate::orchestrator::LegalOrchestrator;
use crate::tools::RagServer;
use crate::utils::HealthReport;
use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<LegalOrchestrator>,
    pub secret_key: Option<String>,
}

impl AppState {
    pub fn new(orchestrator: Arc<LegalOrchestrator>, secret_key: Option<String>) -> Self {
        Self {
            orchestrator,
            secret_key: secret_key.filter(|k| !k.is_empty()),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::Validation(_) | AssistantError::Tool { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

/// `/api/*` requires `Authorization: Bearer <secret>` once a secret is configured.
pub async fn require_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(secret) = state.secret_key.as_deref() else {
        return Ok(next.run(req).await);
    };

    let token = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    if token != secret {
        warn!("Rejected request with invalid bearer token");
        return Err(ApiError::Unauthorized("Invalid bearer token".to_string()));
    }

    Ok(next.run(req).await)
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.orchestrator.health_check().await;
    let status = if report.is_unhealthy() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(report))
}

#[derive(Debug, Deserialize)]
pub struct TextDocument {
    #[serde(default)]
    pub name: Option<String>,
    pub text: String,
}

fn default_language() -> String {
    UserPreferences::default().language
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub documents: Vec<TextDocument>,
    #[serde(default)]
    pub enable_audio: bool,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub allow_pii: bool,
    #[serde(default)]
    pub voice_id: Option<String>,
}

impl QueryRequest {
    fn into_query(self) -> LegalQuery {
        let documents = self
            .documents
            .into_iter()
            .map(|d| UploadedDocument::from_text(d.name, &d.text))
            .collect();

        LegalQuery::new(self.query)
            .with_documents(documents)
            .with_preferences(UserPreferences {
                enable_audio: self.enable_audio,
                language: self.language,
                allow_pii: self.allow_pii,
                voice_id: self.voice_id,
            })
    }
}

/// Failed queries still answer 200; the result carries `success: false`.
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Json<ExecutionResult> {
    info!("API query with {} documents", request.documents.len());
    Json(state.orchestrator.process_legal_query(request.into_query()).await)
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "on" | "yes")
}

pub async fn query_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExecutionResult>, ApiError> {
    let mut query = None;
    let mut documents = Vec::new();
    let mut preferences = UserPreferences::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "document" => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                documents.push(UploadedDocument::new(file_name, bytes.to_vec()));
            }
            "query" => query = Some(field.text().await?),
            "enable_audio" => preferences.enable_audio = parse_bool(&field.text().await?),
            "allow_pii" => preferences.allow_pii = parse_bool(&field.text().await?),
            "language" => preferences.language = field.text().await?,
            "voice_id" => preferences.voice_id = Some(field.text().await?).filter(|v| !v.is_empty()),
            other => warn!("Ignoring unknown multipart field {}", other),
        }
    }

    let query = query.ok_or_else(|| ApiError::BadRequest("Missing 'query' field".to_string()))?;
    info!("API upload query with {} documents", documents.len());

    let legal_query = LegalQuery::new(query)
        .with_documents(documents)
        .with_preferences(preferences);
    Ok(Json(state.orchestrator.process_legal_query(legal_query).await))
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

pub async fn search_documents(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut params = json!({ "query": request.query });
    if let Some(top_k) = request.top_k {
        params["top_k"] = json!(top_k);
    }

    let out = state
        .orchestrator
        .registry()
        .call_server(RagServer::NAME, "search", params)
        .await?;
    Ok(Json(out))
}

pub async fn list_tools(State(state): State<AppState>) -> Json<BTreeMap<String, Vec<String>>> {
    Json(state.orchestrator.registry().list_tools())
}
