// file: src/orchestrator/executor.rs
// description: runs a task graph wave by wave against the tool registry
// reference: orchestrates asynchronous tool execution

use crate::config::OrchestratorConfig;
use crate::error::AssistantError;
use crate::models::{Citation, ExecutionResult, LegalOption, Task, TaskGraph, TaskTrace, TaskType};
use crate::orchestrator::planner::{
    DRAFT_DOCUMENTS, GENERATE_OPTIONS, LLM_REASONING, RAG_RETRIEVAL, TTS_NARRATION, WEB_SEARCH,
};
use crate::tools::{ToolRegistry, is_failure};
use crate::utils::OperationTimer;
use futures::future::join_all;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

const SLOW_TASK: Duration = Duration::from_secs(20);

/// Server and tool a task type is dispatched to.
pub fn route(task_type: TaskType) -> (&'static str, &'static str) {
    match task_type {
        TaskType::Parse => ("parser", "parse_documents"),
        TaskType::RagSearch => ("rag", "search"),
        TaskType::WebSearch => ("websearch", "search"),
        TaskType::LlmReasoning => ("llm", "reason"),
        TaskType::LlmGeneration => ("llm", "generate"),
        TaskType::Tts => ("elevenlabs", "synthesize"),
    }
}

fn merge(base: Map<String, Value>, input: &Value) -> Value {
    let mut out = base;
    if let Some(fields) = input.as_object() {
        for (k, v) in fields {
            out.insert(k.clone(), v.clone());
        }
    }
    Value::Object(out)
}

fn field<'a>(context: &'a Map<String, Value>, task: &str, key: &str) -> Option<&'a Value> {
    context.get(task).and_then(|v| v.get(key))
}

fn string_field(context: &Map<String, Value>, task: &str, key: &str) -> Option<String> {
    field(context, task, key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

struct TaskOutcome {
    trace: TaskTrace,
    output: Result<Value, AssistantError>,
}

pub struct TaskExecutor {
    confidence_threshold: f32,
    retry_backoff: Duration,
}

impl TaskExecutor {
    pub fn new(config: &OrchestratorConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    pub async fn execute_graph(&self, graph: &TaskGraph, registry: &ToolRegistry) -> ExecutionResult {
        let query_id = Uuid::new_v4().to_string();

        let waves = match graph.execution_waves() {
            Ok(waves) => waves,
            Err(e) => {
                error!("Invalid task graph: {}", e);
                return ExecutionResult::failure(&query_id, e.to_string(), Vec::new());
            }
        };

        let mut context = Map::new();
        let mut traces = Vec::new();

        for wave in waves {
            let mut runnable = Vec::new();
            for task in wave {
                if task.conditional && !self.should_execute(task, &context) {
                    info!("Skipping conditional task {}", task.id);
                    traces.push(TaskTrace::skipped(&task.id, task.task_type.as_str()));
                } else {
                    runnable.push(task);
                }
            }

            let snapshot = Value::Object(context.clone());
            let outcomes =
                join_all(runnable.iter().map(|task| self.run_task(task, &snapshot, registry))).await;

            let mut abort = None;
            for (task, outcome) in runnable.into_iter().zip(outcomes) {
                traces.push(outcome.trace);
                match outcome.output {
                    Ok(value) => {
                        context.insert(task.id.clone(), value);
                    }
                    Err(e) => {
                        error!("Task {} failed after retries: {}", task.id, e);
                        if abort.is_none() {
                            abort = Some(e.to_string());
                        }
                    }
                }
            }

            if let Some(error) = abort {
                return ExecutionResult::failure(&query_id, error, traces);
            }
        }

        compile_result(&query_id, &context, traces)
    }

    /// Web search only runs when retrieval confidence is below the threshold.
    fn should_execute(&self, task: &Task, context: &Map<String, Value>) -> bool {
        if task.id != WEB_SEARCH {
            return true;
        }

        let confidence = field(context, RAG_RETRIEVAL, "confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.0) as f32;
        confidence < self.confidence_threshold
    }

    fn build_params(task: &Task, context: &Value) -> Value {
        match task.task_type {
            TaskType::LlmReasoning | TaskType::LlmGeneration => {
                let mut params = task.input.as_object().cloned().unwrap_or_default();
                params.insert("context".to_string(), context.clone());
                Value::Object(params)
            }
            TaskType::Tts => {
                let text = context
                    .get(DRAFT_DOCUMENTS)
                    .and_then(|d| d.get("content"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let mut base = Map::new();
                base.insert("text".to_string(), Value::String(text.to_string()));
                merge(base, &task.input)
            }
            TaskType::Parse | TaskType::RagSearch | TaskType::WebSearch => task.input.clone(),
        }
    }

    async fn run_task(&self, task: &Task, context: &Value, registry: &ToolRegistry) -> TaskOutcome {
        let (server, tool) = route(task.task_type);
        let params = Self::build_params(task, context);
        let timer = OperationTimer::new(&format!("task {}", task.id));
        let max_attempts = task.retry_count.max(1);

        let mut attempts = 0;
        let mut backoff = self.retry_backoff;
        let output = loop {
            attempts += 1;
            match registry.call_server(server, tool, params.clone()).await {
                Ok(value) => break Ok(value),
                Err(e) if attempts < max_attempts => {
                    warn!(
                        "Task {} attempt {}/{} failed: {}, retrying in {}ms",
                        task.id,
                        attempts,
                        max_attempts,
                        e,
                        backoff.as_millis()
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => break Err(e),
            }
        };

        timer.warn_if_slow(SLOW_TASK, &format!("{}.{}", server, tool));
        let duration = timer.finish();

        let (success, error) = match &output {
            Ok(value) if is_failure(value) => {
                let message = value
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("tool reported failure")
                    .to_string();
                warn!("Task {} reported failure: {}", task.id, message);
                (false, Some(message))
            }
            Ok(_) => (true, None),
            Err(e) => (false, Some(e.to_string())),
        };

        TaskOutcome {
            trace: TaskTrace {
                task_id: task.id.clone(),
                task_type: task.task_type.as_str().to_string(),
                success,
                skipped: false,
                attempts,
                duration_ms: duration.as_millis() as u64,
                error,
                metadata: json!({ "server": server, "tool": tool }),
            },
            output,
        }
    }
}

fn compile_result(query_id: &str, context: &Map<String, Value>, traces: Vec<TaskTrace>) -> ExecutionResult {
    let legal_options = field(context, GENERATE_OPTIONS, "options")
        .and_then(Value::as_array)
        .map(|options| {
            options
                .iter()
                .filter_map(|o| match serde_json::from_value::<LegalOption>(o.clone()) {
                    Ok(option) => Some(option),
                    Err(e) => {
                        warn!("Dropping malformed legal option: {}", e);
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let citations = [RAG_RETRIEVAL, WEB_SEARCH]
        .iter()
        .filter_map(|task| field(context, task, "sources").and_then(Value::as_array))
        .flatten()
        .filter_map(|c| match serde_json::from_value::<Citation>(c.clone()) {
            Ok(citation) => Some(citation),
            Err(e) => {
                warn!("Dropping malformed citation: {}", e);
                None
            }
        })
        .collect();

    ExecutionResult {
        summary: string_field(context, LLM_REASONING, "summary"),
        legal_options,
        draft_document: string_field(context, DRAFT_DOCUMENTS, "content"),
        citations,
        audio_url: string_field(context, TTS_NARRATION, "audio_url"),
        confidence_score: field(context, RAG_RETRIEVAL, "confidence")
            .and_then(Value::as_f64)
            .map(|c| c as f32),
        traces,
        ..ExecutionResult::empty(query_id)
    }
}
