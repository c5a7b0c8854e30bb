// file: src/ingest/processor.rs
// description: turns markdown statutes into indexed legal documents
// reference: coordinates corpus scanning, parsing, embedding and insertion

use crate::config::IngestConfig;
use crate::database::{DocumentInserter, LegalRetriever};
use crate::error::{AssistantError, Result};
use crate::ingest::progress::{IngestStats, ProgressTracker};
use crate::ingest::scanner::{CorpusScanner, ScannedFile};
use crate::models::{Jurisdiction, LegalDocument, SourceType};
use crate::parser::{FrontmatterParser, MarkdownParser};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::Path;
use tracing::{error, info, warn};

const INSERT_CHUNK: usize = 64;

/// Corpus-relative path without its extension, so `tn/rent.md` and
/// `india/rent.md` get distinct ids.
pub fn default_doc_id(relative_path: &str) -> String {
    Path::new(relative_path)
        .with_extension("")
        .to_string_lossy()
        .replace('\\', "/")
}

/// Builds a corpus document from a markdown file. Frontmatter supplies
/// `doc_id`, `title`, `jurisdiction` and `source_type`; the relative path,
/// the first heading and the file stem fill in what it leaves out.
pub fn document_from_markdown(file: &str, content: &str) -> Result<LegalDocument> {
    let stem = Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string());

    let (frontmatter, body) = match FrontmatterParser::new().extract(file, content)? {
        Some((frontmatter, body)) => (frontmatter, body),
        None => (Default::default(), content.to_string()),
    };

    let parsed = MarkdownParser::new().parse(&body);

    let doc_id = frontmatter
        .get("doc_id")
        .map(str::to_string)
        .unwrap_or_else(|| default_doc_id(file));
    let title = frontmatter
        .get("title")
        .or_else(|| parsed.title())
        .unwrap_or(stem.as_str())
        .to_string();
    let jurisdiction = frontmatter
        .get("jurisdiction")
        .map(Jurisdiction::parse)
        .unwrap_or(Jurisdiction::Unknown);
    let source_type = frontmatter
        .get("source_type")
        .map(SourceType::parse)
        .unwrap_or(SourceType::Statute);

    if parsed.plain_text.trim().is_empty() {
        return Err(AssistantError::DocumentParse {
            file: file.to_string(),
            message: "document has no text content".to_string(),
        });
    }

    let mut document = LegalDocument::new(
        doc_id,
        title,
        parsed.plain_text,
        jurisdiction,
        source_type,
    );
    // frontmatter edits and moved files must re-index, so the raw file and id are hashed
    document.content_hash = LegalDocument::compute_hash(&format!("{}\n{}", document.doc_id, content));
    Ok(document)
}

enum Prepared {
    Ready {
        file: String,
        document: LegalDocument,
        embedding: Vec<f32>,
    },
    Unchanged {
        file: String,
        doc_id: String,
    },
    Failed,
}

pub struct CorpusIngestor<'a> {
    retriever: &'a LegalRetriever,
    scanner: CorpusScanner,
    workers: usize,
    force_reprocess: bool,
    colored_progress: Option<bool>,
}

impl<'a> CorpusIngestor<'a> {
    pub fn new(retriever: &'a LegalRetriever, config: &IngestConfig) -> Self {
        Self {
            retriever,
            scanner: CorpusScanner::new(config),
            workers: config.parallel_workers.max(1),
            force_reprocess: config.force_reprocess,
            colored_progress: None,
        }
    }

    /// Draws an indicatif progress bar while running.
    pub fn with_progress(mut self, colored: bool) -> Self {
        self.colored_progress = Some(colored);
        self
    }

    pub async fn run(&self, root: &Path, force: bool) -> Result<IngestStats> {
        info!("Starting corpus ingestion from {}", root.display());

        let files = self.scanner.scan_directory(root)?;
        let force = force || self.force_reprocess;

        let existing: HashSet<String> = if force {
            HashSet::new()
        } else {
            self.retriever.store().existing_hashes().await?
        };

        let progress = match self.colored_progress {
            Some(colored) => ProgressTracker::new(files.len(), colored),
            None => ProgressTracker::hidden(files.len()),
        };

        if files.is_empty() {
            warn!("No markdown files found to ingest");
            return Ok(progress.get_stats());
        }

        info!("Processing {} files with {} workers", files.len(), self.workers);

        let prepared: Vec<Prepared> = stream::iter(files)
            .map(|file| self.prepare(file, &existing, &progress))
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let mut claims: Vec<(String, String, Option<(LegalDocument, Vec<f32>)>)> = prepared
            .into_iter()
            .filter_map(|p| match p {
                Prepared::Ready {
                    file,
                    document,
                    embedding,
                } => Some((file, document.doc_id.clone(), Some((document, embedding)))),
                Prepared::Unchanged { file, doc_id } => Some((file, doc_id, None)),
                Prepared::Failed => None,
            })
            .collect();
        claims.sort_by(|a, b| a.0.cmp(&b.0));

        // two files claiming one doc_id would overwrite each other; the first path wins,
        // whether or not that file changed in this run
        let mut seen = HashSet::new();
        let mut documents = Vec::new();
        let mut embeddings = Vec::new();
        for (file, doc_id, payload) in claims {
            let first = seen.insert(doc_id.clone());
            match payload {
                Some((document, embedding)) if first => {
                    documents.push(document);
                    embeddings.push(embedding);
                }
                Some(_) => {
                    warn!("Skipping {}: duplicate doc_id {}", file, doc_id);
                    progress.mark_failed(1);
                }
                None if !first => warn!("{} repeats doc_id {} of an earlier file", file, doc_id),
                None => {}
            }
        }

        self.write(&documents, &embeddings, &progress).await;

        let stats = progress.get_stats();
        progress.finish();
        log_final_stats(&stats);
        Ok(stats)
    }

    async fn prepare(
        &self,
        file: ScannedFile,
        existing: &HashSet<String>,
        progress: &ProgressTracker,
    ) -> Prepared {
        let content = match tokio::fs::read_to_string(&file.path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {}: {}", file.relative_path, e);
                progress.inc_failed();
                return Prepared::Failed;
            }
        };

        let document = match document_from_markdown(&file.relative_path, &content) {
            Ok(document) => document,
            Err(e) => {
                warn!("Failed to parse {}: {}", file.relative_path, e);
                progress.inc_failed();
                return Prepared::Failed;
            }
        };

        if existing.contains(&document.content_hash) {
            progress.inc_unchanged();
            return Prepared::Unchanged {
                file: file.relative_path,
                doc_id: document.doc_id,
            };
        }

        progress.set_message(format!("Embedding {}", file.relative_path));
        let embedding = self
            .retriever
            .embedder()
            .embed(&DocumentInserter::embedding_text(&document))
            .await;

        progress.inc_indexed(file.size);
        Prepared::Ready {
            file: file.relative_path,
            document,
            embedding,
        }
    }

    /// Changed statutes replace their earlier rows. New rows go in first, so
    /// a failed insert leaves the previous version searchable.
    async fn write(&self, documents: &[LegalDocument], embeddings: &[Vec<f32>], progress: &ProgressTracker) {
        let store = self.retriever.store();
        let inserter = DocumentInserter::new(store, self.retriever.embedder());

        for (docs, embs) in documents.chunks(INSERT_CHUNK).zip(embeddings.chunks(INSERT_CHUNK)) {
            let stats = match inserter.insert_with_embeddings(docs, embs).await {
                Ok(stats) => stats,
                Err(e) => {
                    error!("Failed to write {} documents: {}", docs.len(), e);
                    progress.mark_failed(docs.len());
                    continue;
                }
            };

            let ids: Vec<String> = docs.iter().map(|d| d.doc_id.clone()).collect();
            if let Err(e) = store.delete_superseded(&ids, &stats.revision).await {
                error!("Failed to remove superseded rows for {} documents: {}", ids.len(), e);
                progress.mark_failed(docs.len());
            }
        }
    }
}

fn log_final_stats(stats: &IngestStats) {
    info!("=== Ingestion Summary ===");
    info!("Duration: {:.2} seconds", stats.duration_secs);
    info!("Files found: {}", stats.files_found);
    info!("Files indexed: {}", stats.files_indexed);
    info!("Files unchanged: {}", stats.files_unchanged);
    info!("Files failed: {}", stats.files_failed);
    info!("Success rate: {:.1}%", stats.success_rate());
}
