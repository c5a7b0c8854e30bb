// file: src/tools/parser.rs
// description: document parsing tool server for uploaded files
// reference: internal module structure

use crate::config::ParserConfig;
use crate::error::{AssistantError, Result};
use crate::parser::{DocumentText, FactExtractor};
use crate::tools::{ToolServer, failure};
use crate::utils::{HealthCheck, Validator};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ParseParams {
    #[serde(default)]
    documents: Vec<DocumentText>,
}

pub struct ParserServer {
    extractor: FactExtractor,
    max_facts: usize,
    max_document_mb: usize,
}

impl ParserServer {
    pub const NAME: &'static str = "parser";

    pub fn new(config: &ParserConfig) -> Self {
        Self {
            extractor: FactExtractor::new(config.max_facts),
            max_facts: config.max_facts,
            max_document_mb: config.max_document_mb,
        }
    }

    fn parse_documents(&self, documents: &[DocumentText]) -> Value {
        for document in documents {
            if let Err(e) = Validator::validate_document_size(
                &document.name,
                document.text.len(),
                self.max_document_mb,
            ) {
                warn!("{}", e);
                return failure(e);
            }
        }

        let mut facts = Vec::new();
        let mut entities = Vec::new();
        let mut parsed = Vec::new();

        for document in documents {
            debug!("Parsing {} ({:?})", document.name, document.format);

            facts.extend(self.extractor.extract_facts(&document.text));
            entities.extend(self.extractor.extract_entities(&document.text));
            parsed.push(json!({
                "name": document.name,
                "format": document.format,
                "characters": document.text.chars().count(),
            }));
        }

        facts.truncate(self.max_facts);

        json!({
            "success": true,
            "facts": facts,
            "entities": entities,
            "documents": parsed,
            "summary": format!("Parsed {} documents, extracted {} facts", documents.len(), facts.len()),
        })
    }
}

#[async_trait]
impl ToolServer for ParserServer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn tools(&self) -> &'static [&'static str] {
        &["parse_documents"]
    }

    async fn health_check(&self) -> HealthCheck {
        HealthCheck::healthy(Self::NAME, Duration::ZERO)
    }

    async fn call_tool(&self, tool: &str, params: Value) -> Result<Value> {
        match tool {
            "parse_documents" => {
                let params: ParseParams = serde_json::from_value(params).map_err(|e| {
                    AssistantError::tool(Self::NAME, tool, format!("invalid parameters: {}", e))
                })?;
                Ok(self.parse_documents(&params.documents))
            }
            other => Err(AssistantError::unknown_tool(Self::NAME, other)),
        }
    }
}
