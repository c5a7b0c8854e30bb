// file: src/tools/tts.rs
// description: ElevenLabs text-to-speech tool server
// reference: https://elevenlabs.io/docs/api-reference/text-to-speech

use crate::config::TtsConfig;
use crate::error::{AssistantError, Result};
use crate::safety::PiiRedactor;
use crate::tools::{ToolServer, failure};
use crate::utils::HealthCheck;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};

const API_KEY_MISSING: &str = "ElevenLabs API key not configured";

#[derive(Debug, Deserialize)]
struct SynthesizeParams {
    #[serde(default)]
    text: String,
    #[serde(default)]
    voice_id: Option<String>,
    #[serde(default)]
    allow_pii: bool,
}

pub struct TtsServer {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    default_voice: String,
    model_id: String,
    output_dir: PathBuf,
}

/// `audio_<first 16 hex chars of sha256(text)>.mp3`
pub fn audio_filename(text: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(text.as_bytes()));
    format!("audio_{}.mp3", &digest[..16])
}

impl TtsServer {
    pub const NAME: &'static str = "elevenlabs";

    pub fn new(config: &TtsConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_voice: config.voice_id.clone(),
            model_id: config.model_id.clone(),
            output_dir: config.output_dir.clone(),
        })
    }

    async fn synthesize(&self, params: SynthesizeParams) -> Value {
        let Some(api_key) = self.api_key.as_deref() else {
            return failure(API_KEY_MISSING);
        };

        if params.text.trim().is_empty() {
            return failure("No text provided for synthesis");
        }

        let cleaned = PiiRedactor::prepare_for_speech(&params.text, params.allow_pii);
        let voice_id = params.voice_id.as_deref().unwrap_or(&self.default_voice);

        match self.request_audio(api_key, voice_id, &cleaned).await {
            Ok(audio) => {
                let filename = audio_filename(&params.text);
                let path = self.output_dir.join(&filename);

                if let Err(e) = self.write_audio(&path, &audio).await {
                    error!("Failed to store synthesized audio: {}", e);
                    return failure(e);
                }

                info!("Synthesized {} bytes of audio to {}", audio.len(), path.display());
                json!({
                    "success": true,
                    "audio_url": path.to_string_lossy(),
                    "audio_filename": filename,
                    "text_length": cleaned.chars().count(),
                })
            }
            Err(e) => {
                error!("TTS synthesis failed: {}", e);
                failure(e)
            }
        }
    }

    async fn request_audio(&self, api_key: &str, voice_id: &str, text: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .post(format!("{}/text-to-speech/{}", self.base_url, voice_id))
            .header("xi-api-key", api_key)
            .json(&json!({
                "text": text,
                "model_id": self.model_id,
                "voice_settings": {
                    "stability": 0.5,
                    "similarity_boost": 0.5,
                },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssistantError::Upstream(format!(
                "TTS API error: {}",
                response.status().as_u16()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn write_audio(&self, path: &std::path::Path, audio: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| AssistantError::FileOperation {
                path: self.output_dir.clone(),
                source,
            })?;

        tokio::fs::write(path, audio)
            .await
            .map_err(|source| AssistantError::FileOperation {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn list_voices(&self) -> Value {
        let Some(api_key) = self.api_key.as_deref() else {
            return failure(API_KEY_MISSING);
        };

        match self.fetch_voices(api_key).await {
            Ok(voices) => json!({ "success": true, "voices": voices }),
            Err(e) => failure(e),
        }
    }

    async fn fetch_voices(&self, api_key: &str) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}/voices", self.base_url))
            .header("xi-api-key", api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssistantError::Upstream(format!(
                "API error: {}",
                response.status().as_u16()
            )));
        }

        let body: Value = response.json().await?;
        Ok(body.get("voices").cloned().unwrap_or_else(|| json!([])))
    }
}

#[async_trait]
impl ToolServer for TtsServer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn tools(&self) -> &'static [&'static str] {
        &["synthesize", "list_voices"]
    }

    async fn health_check(&self) -> HealthCheck {
        let start = Instant::now();

        let Some(api_key) = self.api_key.as_deref() else {
            return HealthCheck::unhealthy(Self::NAME, API_KEY_MISSING.to_string(), start.elapsed());
        };

        match self.fetch_voices(api_key).await {
            Ok(_) => HealthCheck::healthy(Self::NAME, start.elapsed()),
            Err(e) => HealthCheck::unhealthy(Self::NAME, e.to_string(), start.elapsed()),
        }
    }

    async fn call_tool(&self, tool: &str, params: Value) -> Result<Value> {
        match tool {
            "synthesize" => {
                let params: SynthesizeParams = serde_json::from_value(params).map_err(|e| {
                    AssistantError::tool(Self::NAME, tool, format!("invalid parameters: {}", e))
                })?;
                Ok(self.synthesize(params).await)
            }
            "list_voices" => Ok(self.list_voices().await),
            other => Err(AssistantError::unknown_tool(Self::NAME, other)),
        }
    }
}
