// file: src/tools/rag.rs
// description: retrieval tool server over the LanceDB legal corpus
// reference: https://docs.rs/lancedb

use crate::config::RagConfig;
use crate::database::{LegalRetriever, calculate_confidence};
use crate::error::{AssistantError, Result};
use crate::models::{Citation, Jurisdiction, LegalDocument, SearchResult, SourceType};
use crate::tools::{ToolServer, failure};
use crate::utils::HealthCheck;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Instant;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
    top_k: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct IndexParams {
    document: IndexedDocument,
}

#[derive(Debug, Deserialize)]
struct IndexedDocument {
    #[serde(default)]
    doc_id: Option<String>,
    #[serde(default)]
    title: String,
    content: String,
    #[serde(default = "unknown_jurisdiction")]
    jurisdiction: Jurisdiction,
    #[serde(default = "statute")]
    source_type: SourceType,
}

fn unknown_jurisdiction() -> Jurisdiction {
    Jurisdiction::Unknown
}

fn statute() -> SourceType {
    SourceType::Statute
}

pub struct RagServer {
    retriever: LegalRetriever,
    default_top_k: usize,
}

impl RagServer {
    pub const NAME: &'static str = "rag";

    pub async fn open(config: &RagConfig) -> Result<Self> {
        Ok(Self::new(LegalRetriever::open(config).await?, config.top_k))
    }

    pub fn new(retriever: LegalRetriever, default_top_k: usize) -> Self {
        Self {
            retriever,
            default_top_k,
        }
    }

    async fn search(&self, params: SearchParams) -> Value {
        let top_k = params.top_k.unwrap_or(self.default_top_k);

        match self.retriever.search(&params.query, top_k).await {
            Ok(results) => search_response(&results),
            Err(e) => {
                error!("RAG search failed: {}", e);
                json!({ "success": false, "error": e.to_string(), "confidence": 0.0 })
            }
        }
    }

    async fn index_document(&self, params: IndexParams) -> Value {
        let doc = params.document;
        let document = LegalDocument::new(
            doc.doc_id.unwrap_or_default(),
            doc.title,
            doc.content,
            doc.jurisdiction,
            doc.source_type,
        );

        match self.retriever.index_document(document).await {
            Ok(doc_id) => {
                info!("Indexed document {}", doc_id);
                json!({ "success": true, "doc_id": doc_id })
            }
            Err(e) => failure(e),
        }
    }

    async fn list_documents(&self) -> Value {
        match self.retriever.list_documents().await {
            Ok(documents) => {
                let listed: Vec<Value> = documents
                    .iter()
                    .map(|d| {
                        json!({
                            "doc_id": d.doc_id,
                            "title": d.title,
                            "jurisdiction": d.jurisdiction,
                            "source_type": d.source_type,
                        })
                    })
                    .collect();
                json!({ "success": true, "count": listed.len(), "documents": listed })
            }
            Err(e) => failure(e),
        }
    }
}

pub fn search_response(results: &[SearchResult]) -> Value {
    let sources: Vec<Citation> = results.iter().map(SearchResult::to_citation).collect();

    json!({
        "success": true,
        "results": results,
        "confidence": calculate_confidence(results),
        "sources": sources,
    })
}

fn parse_params<T: serde::de::DeserializeOwned>(tool: &str, params: Value) -> Result<T> {
    serde_json::from_value(params)
        .map_err(|e| AssistantError::tool(RagServer::NAME, tool, format!("invalid parameters: {}", e)))
}

#[async_trait]
impl ToolServer for RagServer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn tools(&self) -> &'static [&'static str] {
        &["search", "index_document", "list_documents"]
    }

    async fn health_check(&self) -> HealthCheck {
        let start = Instant::now();
        let backend = self.retriever.embedder().backend();

        match self.retriever.store().ping().await {
            Ok(_) => HealthCheck::healthy(Self::NAME, start.elapsed()).with_backend(backend),
            Err(e) => {
                HealthCheck::unhealthy(Self::NAME, e.to_string(), start.elapsed()).with_backend(backend)
            }
        }
    }

    async fn call_tool(&self, tool: &str, params: Value) -> Result<Value> {
        match tool {
            "search" => Ok(self.search(parse_params(tool, params)?).await),
            "index_document" => Ok(self.index_document(parse_params(tool, params)?).await),
            "list_documents" => Ok(self.list_documents().await),
            other => Err(AssistantError::unknown_tool(Self::NAME, other)),
        }
    }
}
