//! Conversation graph configuration

use loan_ai::SearchQuery;
use serde::{Deserialize, Serialize};

/// Turn budget used when nothing else is configured
pub const DEFAULT_MAX_TURNS: u32 = 6;

/// Opening line of every conversation
pub const DEFAULT_GREETING: &str =
    "Hello! Welcome to Tata Capital loan assistant. How can I help you today?";

/// Which node decides what to search for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuerySource {
    /// The router returns queries alongside its routing decision
    #[default]
    Router,
    /// The search node writes its own queries from the latest message
    SearchNode,
}

/// How search queries are scoped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub include_domains: Vec<String>,
    pub exclude_domains: Vec<String>,
    pub max_results: u32,
    pub topic: String,
    pub search_depth: String,
    /// Appended to every query so results stay on the lender
    pub query_suffix: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            include_domains: vec!["tatacapital.com".to_string()],
            exclude_domains: Vec::new(),
            max_results: 2,
            topic: "finance".to_string(),
            search_depth: "advanced".to_string(),
            query_suffix: " Tata Capital".to_string(),
        }
    }
}

impl SearchSettings {
    /// Build the collaborator query for one search string
    pub fn query_for(&self, query: &str) -> SearchQuery {
        let text = if self.query_suffix.is_empty()
            || query.to_lowercase().ends_with(&self.query_suffix.trim().to_lowercase())
        {
            query.to_string()
        } else {
            format!("{}{}", query, self.query_suffix)
        };
        SearchQuery {
            query: text,
            include_domains: self.include_domains.clone(),
            exclude_domains: self.exclude_domains.clone(),
            max_results: self.max_results,
            topic: self.topic.clone(),
            search_depth: self.search_depth.clone(),
        }
    }
}

/// Settings for one conversation graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub max_turns: u32,
    pub greeting: String,
    pub lender_name: String,
    pub search: SearchSettings,
    pub query_source: QuerySource,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            greeting: DEFAULT_GREETING.to_string(),
            lender_name: "Tata Capital".to_string(),
            search: SearchSettings::default(),
            query_source: QuerySource::default(),
        }
    }
}
