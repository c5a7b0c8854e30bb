// file: src/ingest/mod.rs
// description: corpus ingestion module exports
// reference: internal module structure

mod processor;
mod progress;
mod scanner;

pub use processor::{CorpusIngestor, document_from_markdown};
pub use progress::{IngestStats, ProgressTracker};
pub use scanner::{CorpusScanner, ScannedFile};
