// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod mcp;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod report;
pub mod safety;
pub mod tools;
pub mod utils;

pub use config::{
    Config, IngestConfig, LlmConfig, McpConfig, OrchestratorConfig, ParserConfig, RagConfig,
    SearchConfig, ServerConfig, TtsConfig,
};
pub use database::{LegalRetriever, LegalStore};
pub use error::{AssistantError, Result};
pub use ingest::{CorpusIngestor, IngestStats};
pub use models::{
    Citation, ExecutionResult, LegalDocument, LegalOption, LegalQuery, SearchResult, TaskGraph,
    TaskType, UploadedDocument, UserPreferences,
};
pub use orchestrator::LegalOrchestrator;
pub use safety::PiiRedactor;
pub use tools::{ToolRegistry, ToolServer};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};
