// file: src/mcp/mod.rs
// description: MCP (Model Context Protocol) server and external server client
// reference: https://docs.rs/rmcp

pub mod client;
pub mod server;

pub use client::ExternalMcpClient;
pub use server::LegalAssistantMcp;
