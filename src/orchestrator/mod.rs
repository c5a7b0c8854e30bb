// file: src/orchestrator/mod.rs
// description: end-to-end legal query processing over the tool registry
// reference: orchestrates asynchronous tool execution

pub mod executor;
pub mod planner;

pub use executor::TaskExecutor;
pub use planner::TaskPlanner;

use crate::config::{Config, OrchestratorConfig};
use crate::error::Result;
use crate::models::{ExecutionResult, LegalQuery};
use crate::parser::extract_uploads;
use crate::tools::ToolRegistry;
use crate::utils::{HealthReport, OperationTimer, Validator};
use tracing::{error, info};
use uuid::Uuid;

pub const ERROR_SUMMARY: &str = "An error occurred while processing your request.";
pub const DEFAULT_MAX_DOCUMENT_MB: usize = 20;

pub struct LegalOrchestrator {
    registry: ToolRegistry,
    executor: TaskExecutor,
    max_query_chars: usize,
    max_document_mb: usize,
}

impl LegalOrchestrator {
    pub fn new(registry: ToolRegistry, config: &OrchestratorConfig) -> Self {
        Self {
            registry,
            executor: TaskExecutor::new(config),
            max_query_chars: config.max_query_chars,
            max_document_mb: DEFAULT_MAX_DOCUMENT_MB,
        }
    }

    pub fn with_document_limit(mut self, max_document_mb: usize) -> Self {
        self.max_document_mb = max_document_mb;
        self
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let registry = ToolRegistry::from_config(config).await?;
        Ok(Self::new(registry, &config.orchestrator)
            .with_document_limit(config.parser.max_document_mb))
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn process_legal_query(&self, query: LegalQuery) -> ExecutionResult {
        let timer = OperationTimer::new("legal query");

        if let Err(e) = Validator::validate_query(&query.query, self.max_query_chars) {
            error!("Rejected query: {}", e);
            return Self::rejected(e.to_string());
        }

        // uploads become text here so the task graph never carries raw bytes
        let documents = match extract_uploads(query.documents, self.max_document_mb).await {
            Ok(documents) => documents,
            Err(e) => {
                error!("Rejected upload: {}", e);
                return Self::rejected(e.to_string());
            }
        };

        let graph = planner::TaskPlanner::create_task_graph(
            query.query.trim(),
            &documents,
            &query.preferences,
        );
        let mut result = self.executor.execute_graph(&graph, &self.registry).await;

        if !result.success && result.summary.is_none() {
            result.summary = Some(ERROR_SUMMARY.to_string());
        }

        info!(
            "Query {} finished (success: {}, citations: {})",
            result.query_id,
            result.success,
            result.citations.len()
        );
        timer.finish_with_count(result.traces.len());
        result
    }

    fn rejected(error: String) -> ExecutionResult {
        let mut result = ExecutionResult::failure(&Uuid::new_v4().to_string(), error, Vec::new());
        result.summary = Some(ERROR_SUMMARY.to_string());
        result
    }

    pub async fn health_check(&self) -> HealthReport {
        HealthReport::new(
            self.registry.health_check_all().await,
            env!("CARGO_PKG_VERSION").to_string(),
        )
    }
}
