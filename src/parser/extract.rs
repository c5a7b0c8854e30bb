// file: src/parser/extract.rs
// description: text extraction from uploaded PDF, DOCX, markdown and plain text bytes
// reference: https://docs.rs/pdf-extract, https://docs.rs/zip

use crate::error::{AssistantError, Result};
use crate::models::UploadedDocument;
use crate::parser::markdown::MarkdownParser;
use crate::utils::Validator;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::io::{Cursor, Read};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

lazy_static! {
    static ref DOCX_PARAGRAPH_END: Regex =
        Regex::new(r"</w:p>").expect("DOCX_PARAGRAPH_END regex is valid");
    static ref DOCX_TEXT_RUN: Regex =
        Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>").expect("DOCX_TEXT_RUN regex is valid");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Markdown,
    PlainText,
}

#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub format: DocumentFormat,
    pub text: String,
}

/// Extracted upload text as it travels through the task graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentText {
    pub name: String,
    pub format: DocumentFormat,
    pub text: String,
}

impl DocumentText {
    pub fn new(name: impl Into<String>, format: DocumentFormat, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format,
            text: text.into(),
        }
    }
}

/// Size-checks and extracts every upload off the async runtime.
/// The first oversized or unreadable document fails the whole batch.
pub async fn extract_uploads(
    documents: Vec<UploadedDocument>,
    max_document_mb: usize,
) -> Result<Vec<DocumentText>> {
    let mut extracted = Vec::with_capacity(documents.len());

    for document in documents {
        let name = document.display_name().to_string();
        Validator::validate_document_size(&name, document.bytes.len(), max_document_mb)?;

        let label = name.clone();
        let text = tokio::task::spawn_blocking(move || {
            extract_text(document.name.as_deref(), &document.bytes)
        })
        .await
        .map_err(|e| AssistantError::DocumentParse {
            file: label,
            message: e.to_string(),
        })??;

        debug!(
            "Extracted {} chars from {} as {:?}",
            text.text.len(),
            name,
            text.format
        );
        extracted.push(DocumentText::new(name, text.format, text.text));
    }

    Ok(extracted)
}

/// Tries PDF, then DOCX, then markdown (by name), then lossy UTF-8.
/// A PDF that cannot be read is an error; a broken DOCX falls through to text.
pub fn extract_text(name: Option<&str>, bytes: &[u8]) -> Result<ExtractedText> {
    let label = name.unwrap_or("<upload>");

    if bytes.starts_with(b"%PDF") {
        return Ok(ExtractedText {
            format: DocumentFormat::Pdf,
            text: extract_pdf(label, bytes)?,
        });
    }

    if bytes.starts_with(b"PK") {
        match extract_docx(bytes) {
            Ok(text) => {
                return Ok(ExtractedText {
                    format: DocumentFormat::Docx,
                    text,
                });
            }
            Err(e) => debug!("{} is not a readable DOCX: {}", label, e),
        }
    }

    let raw = String::from_utf8_lossy(bytes).into_owned();

    let is_markdown = name
        .map(|n| {
            let lower = n.to_ascii_lowercase();
            lower.ends_with(".md") || lower.ends_with(".markdown")
        })
        .unwrap_or(false);

    if is_markdown {
        return Ok(ExtractedText {
            format: DocumentFormat::Markdown,
            text: MarkdownParser::new().parse(&raw).plain_text,
        });
    }

    Ok(ExtractedText {
        format: DocumentFormat::PlainText,
        text: raw,
    })
}

/// pdf-extract panics on some well-formed files (missing fonts in the page
/// resources), so a panic is reported as a parse error for that upload.
fn extract_pdf(label: &str, bytes: &[u8]) -> Result<String> {
    let parse_error = |message: String| AssistantError::DocumentParse {
        file: label.to_string(),
        message,
    };

    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(parse_error(e.to_string())),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!("PDF extraction panicked for {}: {}", label, message);
            Err(parse_error(format!("unreadable PDF ({})", message)))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic".to_string())
}

fn extract_docx(bytes: &[u8]) -> Result<String> {
    let parse_error = |message: String| AssistantError::DocumentParse {
        file: "docx".to_string(),
        message,
    };

    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| parse_error(e.to_string()))?;
    let mut entry = archive
        .by_name("word/document.xml")
        .map_err(|e| parse_error(e.to_string()))?;

    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;

    Ok(docx_xml_to_text(&xml))
}

/// One line per `<w:p>` paragraph, concatenating its `<w:t>` runs.
fn docx_xml_to_text(xml: &str) -> String {
    DOCX_PARAGRAPH_END
        .split(xml)
        .map(|paragraph| {
            DOCX_TEXT_RUN
                .captures_iter(paragraph)
                .filter_map(|c| c.get(1))
                .map(|m| unescape_xml(m.as_str()))
                .collect::<String>()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
