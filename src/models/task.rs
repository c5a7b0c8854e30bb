// file: src/models/task.rs
// description: task graph model with dependency-resolved execution waves
// reference: orchestrator planning and execution

use crate::error::{AssistantError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Parse,
    RagSearch,
    WebSearch,
    LlmReasoning,
    LlmGeneration,
    Tts,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Parse => "parse",
            TaskType::RagSearch => "rag_search",
            TaskType::WebSearch => "web_search",
            TaskType::LlmReasoning => "llm_reasoning",
            TaskType::LlmGeneration => "llm_generation",
            TaskType::Tts => "tts",
        }
    }
}

fn default_retry_count() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub task_type: TaskType,
    pub input: Value,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub conditional: bool,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
}

impl Task {
    pub fn new(id: &str, task_type: TaskType, input: Value) -> Self {
        Self {
            id: id.to_string(),
            task_type,
            input,
            dependencies: Vec::new(),
            conditional: false,
            retry_count: default_retry_count(),
        }
    }

    pub fn depends_on(mut self, dependencies: &[&str]) -> Self {
        self.dependencies = dependencies.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn conditional(mut self) -> Self {
        self.conditional = true;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskGraph {
    pub tasks: Vec<Task>,
}

impl TaskGraph {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Groups tasks into waves. Every task in a wave has all of its
    /// dependencies in earlier waves; declaration order is kept inside a wave.
    pub fn execution_waves(&self) -> Result<Vec<Vec<&Task>>> {
        self.validate()?;

        let mut scheduled: HashSet<&str> = HashSet::new();
        let mut remaining: Vec<&Task> = self.tasks.iter().collect();
        let mut waves = Vec::new();

        while !remaining.is_empty() {
            let (ready, blocked): (Vec<&Task>, Vec<&Task>) = remaining
                .into_iter()
                .partition(|task| task.dependencies.iter().all(|d| scheduled.contains(d.as_str())));

            if ready.is_empty() {
                return Err(AssistantError::CircularDependency(
                    blocked.iter().map(|t| t.id.clone()).collect(),
                ));
            }

            scheduled.extend(ready.iter().map(|t| t.id.as_str()));
            waves.push(ready);
            remaining = blocked;
        }

        Ok(waves)
    }

    pub fn execution_order(&self) -> Result<Vec<&Task>> {
        Ok(self.execution_waves()?.into_iter().flatten().collect())
    }

    fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for task in &self.tasks {
            if !ids.insert(task.id.as_str()) {
                return Err(AssistantError::DuplicateTask(task.id.clone()));
            }
        }

        for task in &self.tasks {
            if let Some(missing) = task.dependencies.iter().find(|d| !ids.contains(d.as_str())) {
                return Err(AssistantError::UnknownDependency {
                    task: task.id.clone(),
                    dependency: missing.clone(),
                });
            }
        }

        Ok(())
    }
}
