//! Tavily search API client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{SearchHit, SearchQuery, WebSearch};
use crate::error::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Environment variable holding the Tavily API key
pub const TAVILY_API_KEY_ENV: &str = "TAVILY_API_KEY";

/// Tavily API client
pub struct TavilyClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TavilyClient {
    /// Create a new client with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(TAVILY_API_KEY_ENV).map_err(|_| Error::InvalidApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Point the client at a different endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl WebSearch for TavilyClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let request = TavilyRequest {
            query: &query.query,
            topic: &query.topic,
            search_depth: &query.search_depth,
            max_results: query.max_results,
            include_domains: query.include_domains.clone(),
            exclude_domains: query.exclude_domains.clone(),
        };
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        tracing::debug!(query = %query.query, "tavily search");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::from_status(status, text));
        }

        let body: TavilyResponse = response.json().await?;
        Ok(body
            .results
            .into_iter()
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                content: r.content,
                score: r.score,
            })
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    topic: &'a str,
    search_depth: &'a str,
    max_results: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    include_domains: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    exclude_domains: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
}
