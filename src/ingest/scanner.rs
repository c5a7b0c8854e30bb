// file: src/ingest/scanner.rs
// description: directory walking and markdown statute discovery with filtering
// reference: https://docs.rs/walkdir

use crate::config::IngestConfig;
use crate::error::Result;
use crate::utils::Validator;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub size: u64,
}

pub struct CorpusScanner {
    skip_patterns: Vec<String>,
    max_file_size_mb: usize,
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"))
        .unwrap_or(false)
}

impl CorpusScanner {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            skip_patterns: config.skip_patterns.clone(),
            max_file_size_mb: config.max_file_size_mb,
        }
    }

    pub fn scan_directory(&self, root: &Path) -> Result<Vec<ScannedFile>> {
        Validator::validate_directory(root)?;
        info!("Scanning corpus directory: {}", root.display());

        let max_size = (self.max_file_size_mb * 1024 * 1024) as u64;
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() || !is_markdown(entry.path()) {
                continue;
            }

            let path = entry.path();
            let relative_path = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");

            if self.should_skip(&relative_path) {
                debug!("Skipping file: {}", relative_path);
                continue;
            }

            let Ok(metadata) = entry.metadata() else {
                continue;
            };

            let size = metadata.len();
            if size > max_size {
                debug!(
                    "Skipping large file ({} MB): {}",
                    size / 1024 / 1024,
                    relative_path
                );
                continue;
            }

            files.push(ScannedFile {
                path: path.to_path_buf(),
                relative_path,
                size,
            });
        }

        info!("Found {} markdown files", files.len());
        Ok(files)
    }

    /// `*.ext` matches a suffix, `dir/*` matches a path component, anything
    /// else is a substring match.
    fn should_skip(&self, relative_path: &str) -> bool {
        self.skip_patterns.iter().any(|pattern| {
            if let Some(suffix) = pattern.strip_prefix('*') {
                relative_path.ends_with(suffix)
            } else if let Some(dir) = pattern.strip_suffix("/*") {
                relative_path.starts_with(&format!("{}/", dir))
                    || relative_path.contains(&format!("/{}/", dir))
            } else {
                relative_path.contains(pattern.as_str())
            }
        })
    }
}
