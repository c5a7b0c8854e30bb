// file: src/config.rs
// description: application configuration management with toml and environment support
// reference: https://docs.rs/config

use crate::error::{AssistantError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Output dimension of embedding models whose size is known up front.
pub fn known_embedding_dim(model: &str) -> Option<usize> {
    match model {
        "BAAI/bge-small-en-v1.5" => Some(384),
        "BAAI/bge-base-en-v1.5" => Some(768),
        "BAAI/bge-en-icl" | "intfloat/e5-mistral-7b-instruct" => Some(4096),
        "BAAI/bge-multilingual-gemma2" => Some(3584),
        "text-embedding-ada-002" | "text-embedding-3-small" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub rag: RagConfig,
    pub search: SearchConfig,
    pub tts: TtsConfig,
    pub orchestrator: OrchestratorConfig,
    pub parser: ParserConfig,
    pub ingest: IngestConfig,
    pub mcp: McpConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub secret_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RagConfig {
    pub uri: String,
    pub table_name: String,
    pub embedding_dim: usize,
    pub top_k: usize,
    pub nebius_api_key: Option<String>,
    pub nebius_base_url: String,
    pub embedding_model: String,
    pub seed_corpus: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_results: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TtsConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub voice_id: String,
    pub model_id: String,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrchestratorConfig {
    pub confidence_threshold: f32,
    pub retry_backoff_ms: u64,
    pub max_query_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParserConfig {
    pub max_document_mb: usize,
    pub max_facts: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    pub parallel_workers: usize,
    pub skip_patterns: Vec<String>,
    pub force_reprocess: bool,
    pub max_file_size_mb: usize,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct McpConfig {
    pub call_timeout_secs: u64,
    #[serde(default)]
    pub servers: Vec<ExternalServerConfig>,
}

/// An external MCP server launched as a child process and spoken to over stdio.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExternalServerConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Config {
    /// Layering: built-in defaults, config file, `TAMILGUARDIAN__*` variables,
    /// then the well-known provider variables (`OPENAI_API_KEY`, ...).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| AssistantError::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path)),
            None => builder
                .add_source(config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false)),
        };

        builder = builder.add_source(
            config::Environment::with_prefix("TAMILGUARDIAN")
                .separator("__")
                .try_parsing(true),
        );

        builder = Self::apply_well_known_env(builder)
            .map_err(|e| AssistantError::Config(e.to_string()))?;

        let settings = builder
            .build()
            .map_err(|e| AssistantError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| AssistantError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn apply_well_known_env(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> std::result::Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError>
    {
        builder
            .set_override_option("llm.api_key", env_var("OPENAI_API_KEY"))?
            .set_override_option("rag.nebius_api_key", env_var("NEBIUS_API_KEY"))?
            .set_override_option("tts.api_key", env_var("ELEVENLABS_API_KEY"))?
            .set_override_option("search.api_key", env_var("SEARCH_API_KEY"))?
            .set_override_option("server.secret_key", env_var("SECRET_KEY"))?
            .set_override_option("server.debug", env_var("DEBUG").map(|v| parse_flag(&v)))
    }

    pub fn default_config() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 7860,
                debug: false,
                secret_key: None,
            },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4".to_string(),
                timeout_secs: 60,
            },
            rag: RagConfig {
                uri: "data/lancedb".to_string(),
                table_name: "legal_documents".to_string(),
                embedding_dim: 384,
                top_k: 10,
                nebius_api_key: None,
                nebius_base_url: "https://api.nebius.ai/v1".to_string(),
                embedding_model: "BAAI/bge-small-en-v1.5".to_string(),
                seed_corpus: true,
            },
            search: SearchConfig {
                api_key: None,
                base_url: "https://api.search.brave.com/res/v1".to_string(),
                max_results: 5,
            },
            tts: TtsConfig {
                api_key: None,
                base_url: "https://api.elevenlabs.io/v1".to_string(),
                voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
                model_id: "eleven_monolingual_v1".to_string(),
                output_dir: std::env::temp_dir().join("tamilguardian-audio"),
            },
            orchestrator: OrchestratorConfig {
                confidence_threshold: 0.7,
                retry_backoff_ms: 200,
                max_query_chars: 4000,
            },
            parser: ParserConfig {
                max_document_mb: 20,
                max_facts: 20,
            },
            ingest: IngestConfig {
                parallel_workers: 4,
                skip_patterns: vec![".git/*".to_string(), "*.zip".to_string()],
                force_reprocess: false,
                max_file_size_mb: 10,
            },
            mcp: McpConfig {
                call_timeout_secs: 30,
                servers: vec![],
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AssistantError::Config("server.port cannot be 0".to_string()));
        }

        if self.rag.embedding_dim == 0 {
            return Err(AssistantError::Config(
                "rag.embedding_dim must be greater than 0".to_string(),
            ));
        }

        match known_embedding_dim(&self.rag.embedding_model) {
            Some(dim) if dim != self.rag.embedding_dim => {
                return Err(AssistantError::Config(format!(
                    "rag.embedding_model {} produces {}-dimension vectors but rag.embedding_dim is {}",
                    self.rag.embedding_model, dim, self.rag.embedding_dim
                )));
            }
            _ => {}
        }

        if self.rag.top_k == 0 {
            return Err(AssistantError::Config(
                "rag.top_k must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.orchestrator.confidence_threshold) {
            return Err(AssistantError::Config(
                "orchestrator.confidence_threshold must be within [0, 1]".to_string(),
            ));
        }

        if self.ingest.parallel_workers == 0 {
            return Err(AssistantError::Config(
                "ingest.parallel_workers must be greater than 0".to_string(),
            ));
        }

        for url in [
            &self.llm.base_url,
            &self.rag.nebius_base_url,
            &self.search.base_url,
            &self.tts.base_url,
        ] {
            Validator::validate_url(url).map_err(|e| AssistantError::Config(e.to_string()))?;
        }

        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 7860);
        assert_eq!(config.orchestrator.confidence_threshold, 0.7);
    }

    #[test]
    fn test_default_embedding_model_matches_dimension() {
        let config = Config::default_config();
        assert_eq!(
            known_embedding_dim(&config.rag.embedding_model),
            Some(config.rag.embedding_dim)
        );

        let shipped = Config::load(Some(Path::new(DEFAULT_CONFIG_PATH))).unwrap();
        assert_eq!(
            known_embedding_dim(&shipped.rag.embedding_model),
            Some(shipped.rag.embedding_dim)
        );
    }

    #[test]
    fn test_rejects_embedding_dimension_mismatch() {
        let mut config = Config::default_config();
        config.rag.embedding_model = "text-embedding-ada-002".to_string();
        assert!(config.validate().is_err());

        config.rag.embedding_model = "custom-model".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let mut config = Config::default_config();
        config.orchestrator.confidence_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let mut config = Config::default_config();
        config.llm.base_url = "api.openai.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[server]\nport = 8080\n\n[rag]\ntop_k = 3\n\n[[mcp.servers]]\nname = \"filesystem\"\ncommand = \"npx\"\nargs = [\"-y\", \"@modelcontextprotocol/server-filesystem\", \".\"]\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.rag.top_k, 3);
        assert_eq!(config.rag.table_name, "legal_documents");
        assert_eq!(config.mcp.servers.len(), 1);
        assert_eq!(config.mcp.servers[0].args.len(), 3);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(parse_flag(" ON "));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("0"));
    }
}
