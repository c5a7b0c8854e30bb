// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod legal;
pub mod query;
pub mod result;
pub mod search_result;
pub mod task;

pub use legal::{Citation, Jurisdiction, LegalDocument, LegalOption, SourceType};
pub use query::{LegalQuery, UploadedDocument, UserPreferences};
pub use result::{ExecutionResult, TaskTrace};
pub use search_result::SearchResult;
pub use task::{Task, TaskGraph, TaskType};
