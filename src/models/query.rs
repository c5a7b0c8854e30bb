// file: src/models/query.rs
// description: user query, uploaded document and preference models
// reference: internal data structures

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedDocument {
    #[serde(default)]
    pub name: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(name: Option<String>, bytes: Vec<u8>) -> Self {
        Self { name, bytes }
    }

    pub fn from_text(name: Option<String>, text: &str) -> Self {
        Self {
            name,
            bytes: text.as_bytes().to_vec(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<upload>")
    }
}

fn default_language() -> String {
    "English".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub enable_audio: bool,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub allow_pii: bool,
    #[serde(default)]
    pub voice_id: Option<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            enable_audio: false,
            language: default_language(),
            allow_pii: false,
            voice_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalQuery {
    pub query: String,
    #[serde(default)]
    pub documents: Vec<UploadedDocument>,
    #[serde(default)]
    pub preferences: UserPreferences,
}

impl LegalQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            documents: Vec::new(),
            preferences: UserPreferences::default(),
        }
    }

    pub fn with_documents(mut self, documents: Vec<UploadedDocument>) -> Self {
        self.documents = documents;
        self
    }

    pub fn with_preferences(mut self, preferences: UserPreferences) -> Self {
        self.preferences = preferences;
        self
    }
}
