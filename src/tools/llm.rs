// file: src/tools/llm.rs
// description: legal reasoning and document generation tool server
// reference: https://platform.openai.com/docs/api-reference/chat

use crate::config::LlmConfig;
use crate::error::{AssistantError, Result};
use crate::llm::prompts::{self, parse_json_object};
use crate::llm::{ChatClient, ChatMessage, Sampling};
use crate::tools::{ToolServer, failure};
use crate::utils::HealthCheck;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Instant;
use tracing::error;

#[derive(Debug, Deserialize)]
struct ReasonParams {
    #[serde(default)]
    query: String,
    #[serde(default)]
    context: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateParams {
    #[serde(rename = "type", default = "default_generation")]
    generation_type: String,
    #[serde(default)]
    context: Value,
}

fn default_generation() -> String {
    "options".to_string()
}

fn array_at<'a>(context: &'a Value, task: &str, key: &str) -> &'a [Value] {
    context
        .get(task)
        .and_then(|v| v.get(key))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn success_with(fields: Map<String, Value>) -> Value {
    let mut out = Map::new();
    out.insert("success".to_string(), Value::Bool(true));
    for (k, v) in fields {
        if k != "success" {
            out.insert(k, v);
        }
    }
    Value::Object(out)
}

pub struct LlmServer {
    client: ChatClient,
}

impl LlmServer {
    pub const NAME: &'static str = "llm";

    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: ChatClient::new(config)?,
        })
    }

    async fn ask(&self, system: &str, user: String, sampling: Sampling) -> Result<String> {
        self.client
            .complete(&[ChatMessage::system(system), ChatMessage::user(user)], sampling)
            .await
    }

    async fn reason(&self, params: ReasonParams) -> Value {
        let context = prompts::build_context_string(
            array_at(&params.context, "rag_retrieval", "results"),
            array_at(&params.context, "web_search", "results"),
            array_at(&params.context, "parse_documents", "facts"),
        );

        let reply = match self
            .ask(
                prompts::REASONING_SYSTEM_PROMPT,
                prompts::reasoning_user_prompt(&params.query, &context),
                prompts::REASONING,
            )
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                error!("LLM reasoning failed: {}", e);
                return failure(e);
            }
        };

        match parse_json_object(&reply) {
            Some(fields) => success_with(fields),
            None => json!({ "success": true, "summary": reply }),
        }
    }

    async fn generate_options(&self, context: &Value) -> Value {
        let reasoning = context.get("llm_reasoning").cloned().unwrap_or(Value::Null);

        let reply = match self
            .ask(
                prompts::OPTIONS_SYSTEM_PROMPT,
                prompts::options_user_prompt(&reasoning),
                prompts::OPTIONS,
            )
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                error!("Options generation failed: {}", e);
                return failure(e);
            }
        };

        match parse_json_object(&reply) {
            Some(fields) => success_with(fields),
            None => {
                error!("Options generation returned non-JSON output");
                failure("Options response was not valid JSON")
            }
        }
    }

    async fn generate_draft(&self, context: &Value) -> Value {
        let reasoning = context.get("llm_reasoning").cloned().unwrap_or(Value::Null);
        let selected = array_at(context, "generate_options", "options").first();

        match self
            .ask(
                prompts::DRAFT_SYSTEM_PROMPT,
                prompts::draft_user_prompt(&reasoning, selected),
                prompts::DRAFT,
            )
            .await
        {
            Ok(content) => json!({
                "success": true,
                "content": content,
                "document_type": "legal_notice",
            }),
            Err(e) => {
                error!("Draft generation failed: {}", e);
                failure(e)
            }
        }
    }
}

#[async_trait]
impl ToolServer for LlmServer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn tools(&self) -> &'static [&'static str] {
        &["reason", "generate"]
    }

    async fn health_check(&self) -> HealthCheck {
        let start = Instant::now();

        if !self.client.has_api_key() {
            return HealthCheck::degraded(
                Self::NAME,
                AssistantError::MissingApiKey("OpenAI").to_string(),
                start.elapsed(),
            );
        }

        match self.client.list_models().await {
            Ok(()) => HealthCheck::healthy(Self::NAME, start.elapsed()),
            Err(e) => HealthCheck::unhealthy(Self::NAME, e.to_string(), start.elapsed()),
        }
    }

    async fn call_tool(&self, tool: &str, params: Value) -> Result<Value> {
        let invalid =
            |e: serde_json::Error| AssistantError::tool(Self::NAME, tool, format!("invalid parameters: {}", e));

        match tool {
            "reason" => Ok(self.reason(serde_json::from_value(params).map_err(invalid)?).await),
            "generate" => {
                let params: GenerateParams = serde_json::from_value(params).map_err(invalid)?;
                match params.generation_type.as_str() {
                    "options" => Ok(self.generate_options(&params.context).await),
                    "draft" => Ok(self.generate_draft(&params.context).await),
                    other => Err(AssistantError::tool(
                        Self::NAME,
                        tool,
                        format!("unknown generation type: {}", other),
                    )),
                }
            }
            other => Err(AssistantError::unknown_tool(Self::NAME, other)),
        }
    }
}
