// file: src/tools/websearch.rs
// description: web search tool server backed by the Brave Search API
// reference: https://api.search.brave.com/app/documentation/web-search

use crate::config::SearchConfig;
use crate::error::{AssistantError, Result};
use crate::models::{Citation, Jurisdiction, SourceType};
use crate::tools::{ToolServer, failure};
use crate::utils::HealthCheck;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tracing::{debug, error};

const QUERY_SUFFIX: &str = "Tamil Nadu law legal rights";
const WEB_CONFIDENCE: f32 = 0.6;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").expect("HTML_TAG regex is valid");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub url: String,
    pub content: String,
    pub source_type: SourceType,
    pub jurisdiction: Jurisdiction,
}

impl WebResult {
    pub fn to_citation(&self) -> Citation {
        Citation {
            doc_id: web_doc_id(&self.url),
            title: self.title.clone(),
            source_type: SourceType::Web,
            jurisdiction: self.jurisdiction,
            confidence: WEB_CONFIDENCE,
            excerpt: Citation::excerpt_of(&self.content),
        }
    }
}

pub fn web_doc_id(url: &str) -> String {
    format!("web_{}", url.replace("https://", "").replace('/', "_"))
}

pub fn enhance_query(query: &str) -> String {
    format!("{} {}", query, QUERY_SUFFIX)
}

/// State sites and pages that talk about Tamil Nadu count as state
/// jurisdiction; everything else is generic web.
fn classify_jurisdiction(url: &str, text: &str) -> Jurisdiction {
    let host = url
        .split("://")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or("");

    if host.ends_with("tn.gov.in") || text.to_lowercase().contains("tamil nadu") {
        Jurisdiction::TamilNadu
    } else {
        Jurisdiction::Web
    }
}

pub fn offline_references() -> Vec<WebResult> {
    vec![
        WebResult {
            title: "Tamil Nadu Legal Services Authority".to_string(),
            url: "https://tnlsa.tn.gov.in".to_string(),
            content: "The Tamil Nadu Legal Services Authority provides free legal aid and services to eligible persons...".to_string(),
            source_type: SourceType::Web,
            jurisdiction: Jurisdiction::TamilNadu,
        },
        WebResult {
            title: "Consumer Rights in Tamil Nadu".to_string(),
            url: "https://example.com/consumer-rights-tn".to_string(),
            content: "Consumer protection laws in Tamil Nadu provide various remedies for defective products and services...".to_string(),
            source_type: SourceType::Web,
            jurisdiction: Jurisdiction::TamilNadu,
        },
    ]
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
}

pub struct WebSearchServer {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    max_results: usize,
}

impl WebSearchServer {
    pub const NAME: &'static str = "websearch";

    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
        })
    }

    async fn brave_search(&self, api_key: &str, query: &str) -> Result<Vec<WebResult>> {
        let url = format!("{}/web/search", self.base_url);
        let count = self.max_results.to_string();

        let response = self
            .client
            .get(&url)
            .header("X-Subscription-Token", api_key)
            .header("Accept", "application/json")
            .query(&[("q", query), ("count", count.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AssistantError::Upstream(format!(
                "Brave search failed with status {}",
                response.status()
            )));
        }

        let body: BraveResponse = response.json().await?;

        Ok(body
            .web
            .map(|w| w.results)
            .unwrap_or_default()
            .into_iter()
            .take(self.max_results)
            .map(|r| {
                let content = HTML_TAG.replace_all(&r.description, "").into_owned();
                let jurisdiction = classify_jurisdiction(&r.url, &format!("{} {}", r.title, content));
                WebResult {
                    title: HTML_TAG.replace_all(&r.title, "").into_owned(),
                    url: r.url,
                    content,
                    source_type: SourceType::Web,
                    jurisdiction,
                }
            })
            .collect())
    }

    async fn search(&self, params: SearchParams) -> Value {
        let enhanced = enhance_query(&params.query);
        debug!("Web search for: {}", enhanced);

        let results = match &self.api_key {
            Some(key) => match self.brave_search(key, &enhanced).await {
                Ok(results) => results,
                Err(e) => {
                    error!("Web search failed: {}", e);
                    return failure(e);
                }
            },
            None => offline_references(),
        };

        let sources: Vec<Citation> = results.iter().map(WebResult::to_citation).collect();
        json!({
            "success": true,
            "query": enhanced,
            "results": results,
            "sources": sources,
        })
    }
}

#[async_trait]
impl ToolServer for WebSearchServer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn tools(&self) -> &'static [&'static str] {
        &["search"]
    }

    async fn health_check(&self) -> HealthCheck {
        if self.api_key.is_some() {
            HealthCheck::healthy(Self::NAME, Duration::ZERO).with_backend("brave")
        } else {
            HealthCheck::degraded(
                Self::NAME,
                "No search API key configured, serving offline references".to_string(),
                Duration::ZERO,
            )
            .with_backend("offline")
        }
    }

    async fn call_tool(&self, tool: &str, params: Value) -> Result<Value> {
        match tool {
            "search" => {
                let start = Instant::now();
                let params: SearchParams = serde_json::from_value(params).map_err(|e| {
                    AssistantError::tool(Self::NAME, tool, format!("invalid parameters: {}", e))
                })?;
                let out = self.search(params).await;
                debug!("Web search took {}ms", start.elapsed().as_millis());
                Ok(out)
            }
            other => Err(AssistantError::unknown_tool(Self::NAME, other)),
        }
    }
}
