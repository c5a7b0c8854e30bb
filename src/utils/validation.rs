// file: src/utils/validation.rs
// description: input validation for queries, uploads, paths and urls
// reference: input validation patterns

use crate::error::{AssistantError, Result};
use std::fs;
use std::path::Path;

pub struct Validator;

impl Validator {
    pub fn validate_query(query: &str, max_chars: usize) -> Result<()> {
        if query.trim().is_empty() {
            return Err(AssistantError::Validation(
                "Please enter a legal question".to_string(),
            ));
        }

        let chars = query.chars().count();
        if chars > max_chars {
            return Err(AssistantError::Validation(format!(
                "Query is too long ({} characters, max {})",
                chars, max_chars
            )));
        }

        Ok(())
    }

    pub fn validate_document_size(name: &str, size_bytes: usize, max_mb: usize) -> Result<()> {
        let limit = max_mb.saturating_mul(1024 * 1024);
        if size_bytes > limit {
            return Err(AssistantError::Validation(format!(
                "Document {} is {} bytes, exceeds the {} MB limit",
                name, size_bytes, max_mb
            )));
        }
        Ok(())
    }

    pub fn validate_file_path(path: &Path) -> Result<()> {
        let canonical = fs::canonicalize(path).map_err(|e| {
            AssistantError::Validation(format!(
                "Cannot canonicalize path {}: {}",
                path.display(),
                e
            ))
        })?;

        if !canonical.is_file() {
            return Err(AssistantError::Validation(format!(
                "Path is not a file: {}",
                canonical.display()
            )));
        }

        Ok(())
    }

    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(AssistantError::Validation(format!(
                "Directory does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(AssistantError::Validation(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AssistantError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    /// Truncates on character boundaries and appends `...` when shortened.
    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        if text.chars().count() <= max_chars {
            text.to_string()
        } else {
            let head: String = text.chars().take(max_chars).collect();
            format!("{}...", head)
        }
    }
}
