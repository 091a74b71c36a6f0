//! Web search collaborator

pub mod tavily;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

pub use tavily::TavilyClient;

/// One search request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    /// Restrict results to these domains (empty means unrestricted)
    #[serde(default)]
    pub include_domains: Vec<String>,
    #[serde(default)]
    pub exclude_domains: Vec<String>,
    pub max_results: u32,
    /// Provider topic hint ("general", "news", "finance")
    pub topic: String,
    /// "basic" or "advanced"
    pub search_depth: String,
}

/// A ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    #[serde(default)]
    pub url: String,
    pub content: String,
    #[serde(default)]
    pub score: f64,
}

/// Opaque query -> ranked snippets function
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Run a query. An empty vector means nothing matched; `Err` means the
    /// provider itself was unreachable or rejected the request.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>>;
}
