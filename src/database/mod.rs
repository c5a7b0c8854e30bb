// file: src/database/mod.rs
// description: vector store module exports
// reference: internal module structure

pub mod client;
pub mod embeddings;
pub mod insert;
pub mod retriever;
pub mod schema;

pub use client::LegalStore;
pub use embeddings::{Embedder, NebiusEmbeddingClient, local_embedding};
pub use insert::{DocumentInserter, InsertStats};
pub use retriever::{LegalRetriever, calculate_confidence, seed_documents};
pub use schema::SchemaManager;
