// file: src/models/search_result.rs
// description: Search result model with similarity scores
// reference: Used for vector similarity search results

use crate::models::{Citation, Jurisdiction, LegalDocument, SourceType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub doc_id: String,

    pub title: String,

    pub content: String,

    pub jurisdiction: Jurisdiction,

    pub source_type: SourceType,

    /// Similarity score after jurisdiction boosting (higher is more relevant)
    pub score: f32,

    /// Raw distance reported by the vector index (lower is more similar)
    pub distance: Option<f32>,
}

impl SearchResult {
    pub fn from_document(document: LegalDocument, score: f32, distance: Option<f32>) -> Self {
        Self {
            doc_id: document.doc_id,
            title: document.title,
            content: document.content,
            jurisdiction: document.jurisdiction,
            source_type: document.source_type,
            score,
            distance,
        }
    }

    pub fn to_citation(&self) -> Citation {
        Citation {
            doc_id: self.doc_id.clone(),
            title: self.title.clone(),
            source_type: self.source_type,
            jurisdiction: self.jurisdiction,
            confidence: self.score,
            excerpt: Citation::excerpt_of(&self.content),
        }
    }

    /// Format as a summary string for display
    pub fn format_summary(&self, max_content_len: usize) -> String {
        let content_preview = if self.content.chars().count() > max_content_len {
            format!(
                "{}...",
                self.content.chars().take(max_content_len).collect::<String>()
            )
        } else {
            self.content.clone()
        };

        format!(
            "Score: {:.4} | [{}] {} ({})\n{}\n",
            self.score,
            self.doc_id,
            self.title,
            self.jurisdiction.as_str(),
            content_preview
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(score: f32) -> SearchResult {
        SearchResult::from_document(
            LegalDocument::new(
                "tn_rent_control_act_2019",
                "Tamil Nadu Rent Control Act 2019",
                "This is a very long content that will be truncated",
                Jurisdiction::TamilNadu,
                SourceType::Statute,
            ),
            score,
            Some(0.2),
        )
    }

    #[test]
    fn test_citation_conversion() {
        let citation = sample(0.95).to_citation();
        assert_eq!(citation.doc_id, "tn_rent_control_act_2019");
        assert_eq!(citation.confidence, 0.95);
        assert_eq!(citation.jurisdiction, Jurisdiction::TamilNadu);
        assert!(citation.excerpt.ends_with("..."));
    }

    #[test]
    fn test_format_summary() {
        let summary = sample(0.87).format_summary(20);
        assert!(summary.contains("0.8700"));
        assert!(summary.contains("tn_rent_control_act_2019"));
        assert!(summary.contains("tamil_nadu"));
        assert!(summary.contains("..."));
    }
}
