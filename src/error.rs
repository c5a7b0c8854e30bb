// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0} API key not configured")]
    MissingApiKey(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown server: {0}")]
    UnknownServer(String),

    #[error("Unknown tool: {server}.{tool}")]
    UnknownTool { server: String, tool: String },

    #[error("Tool {server}.{tool} failed: {message}")]
    Tool {
        server: String,
        tool: String,
        message: String,
    },

    #[error("Task graph references unknown dependency '{dependency}' (from task '{task}')")]
    UnknownDependency { task: String, dependency: String },

    #[error("Circular dependency detected in task graph: {0:?}")]
    CircularDependency(Vec<String>),

    #[error("Duplicate task id in task graph: {0}")]
    DuplicateTask(String),

    #[error("Upstream API error: {0}")]
    Upstream(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Document parsing error in {file}: {message}")]
    DocumentParse { file: String, message: String },

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("MCP error: {0}")]
    Mcp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AssistantError {
    pub fn tool(server: &str, tool: &str, message: impl Into<String>) -> Self {
        Self::Tool {
            server: server.to_string(),
            tool: tool.to_string(),
            message: message.into(),
        }
    }

    pub fn unknown_tool(server: &str, tool: &str) -> Self {
        Self::UnknownTool {
            server: server.to_string(),
            tool: tool.to_string(),
        }
    }
}
