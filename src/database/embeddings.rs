// file: src/database/embeddings.rs
// description: Nebius embedding API client with a deterministic local fallback
// reference: https://docs.nebius.com/studio/inference/api

use crate::config::RagConfig;
use crate::error::{AssistantError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::{debug, warn};

lazy_static! {
    static ref TOKEN_PATTERN: Regex =
        Regex::new(r"[\p{L}\p{M}\p{N}]+").expect("TOKEN_PATTERN regex is valid");
    static ref STOP_WORDS: HashSet<&'static str> = [
        "a", "an", "and", "are", "as", "at", "be", "by", "can", "do", "for", "from", "has",
        "have", "i", "if", "in", "is", "it", "its", "me", "my", "of", "on", "or", "that", "the",
        "this", "to", "was", "what", "when", "which", "who", "will", "with",
    ]
    .into_iter()
    .collect();
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct NebiusEmbeddingClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl NebiusEmbeddingClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    pub async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", self.base_url);

        debug!("Requesting embedding from Nebius for {} chars", text.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                input: text,
                model: &self.model,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AssistantError::Upstream(format!(
                "Nebius embeddings request failed with status {}: {}",
                status, error_text
            )));
        }

        let embedding_response: EmbeddingResponse = response.json().await?;

        embedding_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                AssistantError::Upstream("No embedding data returned from Nebius".to_string())
            })
    }
}

/// Hashed bag-of-words embedding. Each token's sha256 selects a bucket and a
/// sign; the result is L2-normalised so cosine distance is meaningful.
pub fn local_embedding(text: &str, dim: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dim];
    if dim == 0 {
        return vector;
    }

    let lowered = text.to_lowercase();
    for token in TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !STOP_WORDS.contains(t))
    {
        let digest = Sha256::digest(token.as_bytes());
        let bucket = u64::from_le_bytes([
            digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
        ]) as usize
            % dim;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|v| *v /= norm);
    }
    vector
}

/// Picks the remote backend when a key is configured and falls back to the
/// local embedding whenever the remote call fails or returns the wrong size.
pub struct Embedder {
    remote: Option<NebiusEmbeddingClient>,
    dim: usize,
}

impl Embedder {
    pub fn new(config: &RagConfig) -> Self {
        let remote = config.nebius_api_key.as_ref().map(|key| {
            NebiusEmbeddingClient::new(
                key.clone(),
                config.nebius_base_url.clone(),
                config.embedding_model.clone(),
            )
        });

        if remote.is_none() {
            debug!("No Nebius API key configured, using local embeddings");
        }

        Self {
            remote,
            dim: config.embedding_dim,
        }
    }

    pub fn local(dim: usize) -> Self {
        Self { remote: None, dim }
    }

    pub fn backend(&self) -> &'static str {
        if self.remote.is_some() { "nebius" } else { "local" }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub async fn embed(&self, text: &str) -> Vec<f32> {
        if let Some(ref client) = self.remote {
            match client.generate_embedding(text).await {
                Ok(embedding) if embedding.len() == self.dim => return embedding,
                Ok(embedding) => warn!(
                    "Nebius returned embedding with dimension {}, expected {}. Using local.",
                    embedding.len(),
                    self.dim
                ),
                Err(e) => warn!("Nebius embedding failed: {}. Using local.", e),
            }
        }

        local_embedding(text, self.dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_local_embedding_is_normalised() {
        let embedding = local_embedding("tenant eviction notice", 384);
        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_local_embedding_deterministic() {
        assert_eq!(local_embedding("same text", 128), local_embedding("same text", 128));
    }

    #[test]
    fn test_tamil_words_stay_whole() {
        let tokens: Vec<&str> = TOKEN_PATTERN
            .find_iter("தமிழ்நாடு வாடகை சட்டம்")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(tokens, vec!["தமிழ்நாடு", "வாடகை", "சட்டம்"]);

        let query = local_embedding("வாடகை சட்டம்", 384);
        let related = local_embedding("தமிழ்நாடு வாடகை சட்டம் குத்தகைதாரர்", 384);
        let unrelated = local_embedding("வேலை நேரம் கடைகள்", 384);
        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn test_stop_words_only_gives_zero_vector() {
        let embedding = local_embedding("the of and", 64);
        assert!(embedding.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_shared_tokens_are_closer() {
        let query = local_embedding("rent tenant landlord", 384);
        let related = local_embedding("Rent Control Act protects the tenant from the landlord", 384);
        let unrelated = local_embedding("working hours in shops and establishments", 384);
        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_remote_embedding_used_when_dimension_matches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.5, 0.5, 0.5, 0.5]}]
            })))
            .mount(&server)
            .await;

        let mut config = Config::default_config().rag;
        config.nebius_api_key = Some("test-key".to_string());
        config.nebius_base_url = server.uri();
        config.embedding_dim = 4;

        let embedder = Embedder::new(&config);
        assert_eq!(embedder.backend(), "nebius");
        assert_eq!(embedder.embed("rent").await, vec![0.5, 0.5, 0.5, 0.5]);
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_local() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut config = Config::default_config().rag;
        config.nebius_api_key = Some("test-key".to_string());
        config.nebius_base_url = server.uri();
        config.embedding_dim = 16;

        let embedder = Embedder::new(&config);
        assert_eq!(embedder.embed("rent").await, local_embedding("rent", 16));
    }
}
