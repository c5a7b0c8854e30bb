// file: src/api/mod.rs
// description: HTTP JSON API over the legal orchestrator
// reference: https://docs.rs/axum

pub mod handlers;
pub mod routes;

pub use handlers::{ApiError, AppState};
pub use routes::{create_router, serve};
