// file: src/tools/mod.rs
// description: tool server contract and the registry the orchestrator dispatches through
// reference: internal module structure

pub mod llm;
pub mod parser;
pub mod rag;
pub mod tts;
pub mod websearch;

use crate::config::Config;
use crate::error::{AssistantError, Result};
use crate::mcp::client::ExternalMcpClient;
use crate::utils::HealthCheck;
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

pub use llm::LlmServer;
pub use parser::ParserServer;
pub use rag::RagServer;
pub use tts::TtsServer;
pub use websearch::WebSearchServer;

/// A named group of JSON-in / JSON-out tools.
///
/// `call_tool` returns `Err` only when the call itself is wrong (unknown
/// tool, invalid parameters); the executor retries those with backoff.
/// Upstream, transport and storage failures come back inside the value as
/// `{"success": false, "error": ...}` and are not retried.
#[async_trait]
pub trait ToolServer: Send + Sync {
    fn name(&self) -> &'static str;

    fn tools(&self) -> &'static [&'static str];

    async fn health_check(&self) -> HealthCheck;

    async fn call_tool(&self, tool: &str, params: Value) -> Result<Value>;
}

pub fn failure(error: impl std::fmt::Display) -> Value {
    json!({ "success": false, "error": error.to_string() })
}

pub fn is_failure(value: &Value) -> bool {
    value.get("success").and_then(Value::as_bool) == Some(false)
}

#[derive(Default, Clone)]
pub struct ToolRegistry {
    servers: Vec<Arc<dyn ToolServer>>,
    external: Option<Arc<ExternalMcpClient>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the five built-in servers and, when any are configured, the
    /// client for external MCP servers.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::new()
            .with_server(Arc::new(RagServer::open(&config.rag).await?))
            .with_server(Arc::new(WebSearchServer::new(&config.search)?))
            .with_server(Arc::new(ParserServer::new(&config.parser)))
            .with_server(Arc::new(LlmServer::new(&config.llm)?))
            .with_server(Arc::new(TtsServer::new(&config.tts)?));

        if !config.mcp.servers.is_empty() {
            let client = ExternalMcpClient::new(&config.mcp);
            info!("External MCP servers: {}", client.server_names().join(", "));
            registry.external = Some(Arc::new(client));
        }

        info!("Tool registry ready: {}", registry.server_names().join(", "));
        Ok(registry)
    }

    /// Registering a name twice replaces the earlier server.
    pub fn with_server(mut self, server: Arc<dyn ToolServer>) -> Self {
        self.servers.retain(|s| s.name() != server.name());
        self.servers.push(server);
        self
    }

    pub fn with_external(mut self, client: ExternalMcpClient) -> Self {
        self.external = Some(Arc::new(client));
        self
    }

    pub fn server(&self, name: &str) -> Option<&Arc<dyn ToolServer>> {
        self.servers.iter().find(|s| s.name() == name)
    }

    pub fn server_names(&self) -> Vec<&'static str> {
        self.servers.iter().map(|s| s.name()).collect()
    }

    pub async fn call_server(&self, server: &str, tool: &str, params: Value) -> Result<Value> {
        let target = self
            .server(server)
            .ok_or_else(|| AssistantError::UnknownServer(server.to_string()))?;

        debug!("Calling {}.{}", server, tool);
        target.call_tool(tool, params).await
    }

    pub async fn health_check_all(&self) -> Vec<HealthCheck> {
        join_all(self.servers.iter().map(|s| s.health_check())).await
    }

    pub fn list_tools(&self) -> BTreeMap<String, Vec<String>> {
        self.servers
            .iter()
            .map(|s| {
                (
                    s.name().to_string(),
                    s.tools().iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect()
    }

    pub async fn call_external(&self, server: &str, tool: &str, arguments: Value) -> Value {
        match &self.external {
            Some(client) => client.call_tool(server, tool, arguments).await,
            None => failure("No external MCP servers configured"),
        }
    }

    pub async fn list_external_tools(&self, server: &str) -> Value {
        match &self.external {
            Some(client) => client.list_tools(server).await,
            None => failure("No external MCP servers configured"),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type Handler = Box<dyn Fn(&str, &Value, usize) -> Result<Value> + Send + Sync>;

    /// Scripted server for orchestrator tests. The handler gets the tool
    /// name, the params and the zero-based call number.
    pub struct StubServer {
        name: &'static str,
        handler: Handler,
        calls: AtomicUsize,
        pub received: Mutex<Vec<(String, Value)>>,
    }

    impl StubServer {
        pub fn new(
            name: &'static str,
            handler: impl Fn(&str, &Value, usize) -> Result<Value> + Send + Sync + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                name,
                handler: Box::new(handler),
                calls: AtomicUsize::new(0),
                received: Mutex::new(Vec::new()),
            })
        }

        pub fn returning(name: &'static str, value: Value) -> Arc<Self> {
            Self::new(name, move |_, _, _| Ok(value.clone()))
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ToolServer for StubServer {
        fn name(&self) -> &'static str {
            self.name
        }

        fn tools(&self) -> &'static [&'static str] {
            &["stub"]
        }

        async fn health_check(&self) -> HealthCheck {
            HealthCheck::healthy(self.name, Duration::ZERO)
        }

        async fn call_tool(&self, tool: &str, params: Value) -> Result<Value> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.received
                .lock()
                .expect("stub mutex poisoned")
                .push((tool.to_string(), params.clone()));
            (self.handler)(tool, &params, n)
        }
    }
}
