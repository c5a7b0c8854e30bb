// file: src/models/result.rs
// description: execution result and per-task trace models
// reference: internal data structures

use crate::models::{Citation, LegalOption};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTrace {
    pub task_id: String,
    pub task_type: String,
    pub success: bool,
    pub skipped: bool,
    pub attempts: u32,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub metadata: Value,
}

impl TaskTrace {
    pub fn skipped(task_id: &str, task_type: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            task_type: task_type.to_string(),
            success: true,
            skipped: true,
            attempts: 0,
            duration_ms: 0,
            error: None,
            metadata: Value::Null,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub query_id: String,
    pub success: bool,
    pub summary: Option<String>,
    pub legal_options: Vec<LegalOption>,
    pub draft_document: Option<String>,
    pub citations: Vec<Citation>,
    pub audio_url: Option<String>,
    pub error: Option<String>,
    pub traces: Vec<TaskTrace>,
    pub confidence_score: Option<f32>,
}

impl ExecutionResult {
    pub fn empty(query_id: &str) -> Self {
        Self {
            query_id: query_id.to_string(),
            success: true,
            summary: None,
            legal_options: Vec::new(),
            draft_document: None,
            citations: Vec::new(),
            audio_url: None,
            error: None,
            traces: Vec::new(),
            confidence_score: None,
        }
    }

    pub fn failure(query_id: &str, error: String, traces: Vec<TaskTrace>) -> Self {
        Self {
            success: false,
            error: Some(error),
            traces,
            ..Self::empty(query_id)
        }
    }

    pub fn trace(&self, task_id: &str) -> Option<&TaskTrace> {
        self.traces.iter().find(|t| t.task_id == task_id)
    }
}
