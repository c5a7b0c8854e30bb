// file: src/llm/mod.rs
// description: language model client and prompt module exports
// reference: internal module structure

pub mod client;
pub mod prompts;

pub use client::{ChatClient, ChatMessage, Sampling};
