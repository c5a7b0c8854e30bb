// file: src/mcp/server.rs
// description: MCP server exposing the legal assistant as agent tools over stdio
// reference: https://docs.rs/rmcp

use crate::error::{AssistantError, Result};
use crate::models::{LegalQuery, UserPreferences};
use crate::orchestrator::LegalOrchestrator;
use crate::parser::{DocumentFormat, DocumentText};
use crate::report;
use crate::tools::{ParserServer, RagServer};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::tool::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, ServiceExt, schemars, tool, tool_handler, tool_router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct AskRequest {
    /// The legal question, in plain language
    pub question: String,
    /// Narrate the draft notice with text-to-speech
    #[serde(default)]
    pub enable_audio: bool,
    /// Keep phone numbers, emails and names in the narration
    #[serde(default)]
    pub allow_pii: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct SearchRequest {
    /// Search query text
    pub query: String,
    /// Maximum number of results to return (default: 10)
    pub top_k: Option<usize>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct FactsRequest {
    /// Document text to analyse
    pub text: String,
    /// Optional file name; `.md` names are parsed as markdown
    pub name: Option<String>,
}

fn internal(e: AssistantError) -> McpError {
    McpError::internal_error(e.to_string(), None)
}

fn json_content(value: &Value) -> std::result::Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| internal(e.into()))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[derive(Clone)]
pub struct LegalAssistantMcp {
    orchestrator: Arc<LegalOrchestrator>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl LegalAssistantMcp {
    pub fn new(orchestrator: Arc<LegalOrchestrator>) -> Self {
        Self {
            orchestrator,
            tool_router: Self::tool_router(),
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect()
    }

    pub async fn serve_stdio(self) -> Result<()> {
        info!("Starting MCP stdio transport");
        let service = self
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| AssistantError::Mcp(e.to_string()))?;
        service
            .waiting()
            .await
            .map_err(|e| AssistantError::Mcp(e.to_string()))?;
        Ok(())
    }

    #[tool(description = "Answer a Tamil Nadu legal question: summary, practical options, a draft legal notice and cited sources.")]
    async fn ask_legal_question(
        &self,
        Parameters(request): Parameters<AskRequest>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("MCP: ask_legal_question");

        let query = LegalQuery::new(request.question).with_preferences(UserPreferences {
            enable_audio: request.enable_audio,
            allow_pii: request.allow_pii,
            ..UserPreferences::default()
        });

        let result = self.orchestrator.process_legal_query(query).await;
        let text = report::render_markdown(&result);

        if result.success {
            Ok(CallToolResult::success(vec![Content::text(text)]))
        } else {
            Ok(CallToolResult::error(vec![Content::text(text)]))
        }
    }

    #[tool(description = "Vector search over the indexed statutes, boosted towards Tamil Nadu law.")]
    async fn search_legal_documents(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("MCP: search_legal_documents for {}", request.query);

        let mut params = json!({ "query": request.query });
        if let Some(top_k) = request.top_k {
            params["top_k"] = json!(top_k);
        }

        let out = self
            .orchestrator
            .registry()
            .call_server(RagServer::NAME, "search", params)
            .await
            .map_err(internal)?;
        json_content(&out)
    }

    #[tool(description = "Extract dates, amounts, addresses, legal context and contact entities from document text.")]
    async fn extract_document_facts(
        &self,
        Parameters(request): Parameters<FactsRequest>,
    ) -> std::result::Result<CallToolResult, McpError> {
        info!("MCP: extract_document_facts");

        let name = request.name.unwrap_or_else(|| "<upload>".to_string());
        let document = DocumentText::new(name, DocumentFormat::PlainText, request.text);
        let out = self
            .orchestrator
            .registry()
            .call_server(
                ParserServer::NAME,
                "parse_documents",
                json!({ "documents": [document] }),
            )
            .await
            .map_err(internal)?;
        json_content(&out)
    }

    #[tool(description = "Report the health of every tool server.")]
    async fn check_health(&self) -> std::result::Result<CallToolResult, McpError> {
        info!("MCP: check_health");
        let report = self.orchestrator.health_check().await;
        Ok(CallToolResult::success(vec![Content::text(report.format())]))
    }
}

#[tool_handler]
impl ServerHandler for LegalAssistantMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Legal assistant for Tamil Nadu residents. Use ask_legal_question for full answers, \
                 search_legal_documents for statute lookup, extract_document_facts for uploaded text."
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::tools::ToolRegistry;
    use crate::tools::testing::StubServer;

    fn mcp() -> (LegalAssistantMcp, Arc<StubServer>) {
        let parser = StubServer::returning("parser", json!({"success": true, "facts": ["Date mentioned: 01/02/2024"]}));
        let registry = ToolRegistry::new()
            .with_server(StubServer::returning("rag", json!({"success": true, "results": [], "confidence": 0.0})))
            .with_server(parser.clone());
        let orchestrator = LegalOrchestrator::new(registry, &Config::default_config().orchestrator);
        (LegalAssistantMcp::new(Arc::new(orchestrator)), parser)
    }

    #[test]
    fn test_tools_are_registered() {
        let (mcp, _) = mcp();
        let mut names = mcp.tool_names();
        names.sort();
        assert_eq!(
            names,
            vec![
                "ask_legal_question",
                "check_health",
                "extract_document_facts",
                "search_legal_documents"
            ]
        );
    }

    #[tokio::test]
    async fn test_extract_facts_routes_to_parser() {
        let (mcp, parser) = mcp();
        let out = mcp
            .extract_document_facts(Parameters(FactsRequest {
                text: "Notice dated 01/02/2024".to_string(),
                name: Some("notice.txt".to_string()),
            }))
            .await
            .unwrap();

        assert_ne!(out.is_error, Some(true));
        let received = parser.received.lock().unwrap();
        let document = &received[0].1["documents"][0];
        assert_eq!(document["name"], "notice.txt");
        assert_eq!(document["text"], "Notice dated 01/02/2024");
    }

    #[tokio::test]
    async fn test_search_unknown_server_is_error() {
        let orchestrator = LegalOrchestrator::new(ToolRegistry::new(), &Config::default_config().orchestrator);
        let mcp = LegalAssistantMcp::new(Arc::new(orchestrator));

        let out = mcp
            .search_legal_documents(Parameters(SearchRequest {
                query: "rent".to_string(),
                top_k: Some(3),
            }))
            .await;
        assert!(out.is_err());
    }
}
