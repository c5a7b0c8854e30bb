// file: src/models/legal.rs
// description: legal corpus document, citation and option models
// reference: internal data structures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Jurisdiction {
    TamilNadu,
    India,
    Web,
    #[serde(other)]
    Unknown,
}

impl Jurisdiction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Jurisdiction::TamilNadu => "tamil_nadu",
            Jurisdiction::India => "india",
            Jurisdiction::Web => "web",
            Jurisdiction::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "tamil_nadu" | "tn" => Jurisdiction::TamilNadu,
            "india" => Jurisdiction::India,
            "web" => Jurisdiction::Web,
            _ => Jurisdiction::Unknown,
        }
    }

    /// Ranking weight: state law outranks national law, which outranks everything else.
    pub fn boost(&self) -> f32 {
        match self {
            Jurisdiction::TamilNadu => 1.5,
            Jurisdiction::India => 1.2,
            Jurisdiction::Web | Jurisdiction::Unknown => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Statute,
    CaseLaw,
    Web,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Statute => "statute",
            SourceType::CaseLaw => "case_law",
            SourceType::Web => "web",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "case_law" | "case" | "judgment" => SourceType::CaseLaw,
            "web" => SourceType::Web,
            _ => SourceType::Statute,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalDocument {
    pub doc_id: String,
    pub title: String,
    pub content: String,
    pub jurisdiction: Jurisdiction,
    pub source_type: SourceType,
    #[serde(default)]
    pub content_hash: String,
}

impl LegalDocument {
    pub fn new(
        doc_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        jurisdiction: Jurisdiction,
        source_type: SourceType,
    ) -> Self {
        let content = content.into();
        let content_hash = Self::compute_hash(&content);

        Self {
            doc_id: doc_id.into(),
            title: title.into(),
            content,
            jurisdiction,
            source_type,
            content_hash,
        }
    }

    pub fn compute_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Fills in the hash for documents that arrived over the wire without one.
    pub fn ensure_hash(&mut self) {
        if self.content_hash.is_empty() {
            self.content_hash = Self::compute_hash(&self.content);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub doc_id: String,
    pub title: String,
    pub source_type: SourceType,
    pub jurisdiction: Jurisdiction,
    pub confidence: f32,
    pub excerpt: String,
}

impl Citation {
    pub const EXCERPT_CHARS: usize = 200;

    pub fn excerpt_of(content: &str) -> String {
        let head: String = content.chars().take(Self::EXCERPT_CHARS).collect();
        format!("{}...", head)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalOption {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub estimated_cost: Option<String>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub success_probability: Option<String>,
}
