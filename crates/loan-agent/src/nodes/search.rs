//! The search node: web lookups summarized into one digest

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use loan_ai::{SearchHit, TextCompletion, WebSearch};

use crate::config::{GraphConfig, QuerySource, SearchSettings};
use crate::error::Result;
use crate::graph::{Next, Node, NodeId};
use crate::json::parse_json_object;
use crate::prompts;
use crate::state::ConversationState;

/// Section body for a query that matched nothing
pub const NO_RESULTS: &str = "No specific information found.";

/// Whole digest when the search provider fails
pub const SEARCH_UNAVAILABLE: &str = "Search temporarily unavailable.";

/// Section body when the summary call fails
pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable.";

const MAX_GENERATED_QUERIES: usize = 5;

/// Resolves pending queries into a labelled search digest
pub struct SearchNode {
    llm: Arc<dyn TextCompletion>,
    search: Arc<dyn WebSearch>,
    settings: SearchSettings,
    lender: String,
    query_source: QuerySource,
}

impl SearchNode {
    pub fn new(
        llm: Arc<dyn TextCompletion>,
        search: Arc<dyn WebSearch>,
        config: &GraphConfig,
    ) -> Self {
        Self {
            llm,
            search,
            settings: config.search.clone(),
            lender: config.lender_name.clone(),
            query_source: config.query_source,
        }
    }

    /// Write queries for the latest message. Falls back to the message itself.
    async fn generate_queries(&self, state: &ConversationState) -> Vec<String> {
        let Some(message) = state.history.last_user_message() else {
            return Vec::new();
        };
        let prompt =
            prompts::query_generation(&self.lender, message, &state.profile.to_json_pretty());

        let generated = match self.llm.complete(&prompt).await {
            Ok(reply) => parse_json_object(&reply)
                .and_then(|map| map.get("queries").cloned())
                .and_then(|v| serde_json::from_value::<Vec<String>>(v).ok())
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "query generation failed");
                Vec::new()
            }
        };

        let queries: Vec<String> = generated
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .take(MAX_GENERATED_QUERIES)
            .collect();
        if queries.is_empty() {
            tracing::warn!("no usable generated queries, searching the message itself");
            return vec![message.to_string()];
        }
        queries
    }

    /// Search every query concurrently, then summarize in query order.
    async fn digest(&self, queries: &[String]) -> String {
        let lookups = join_all(queries.iter().map(|q| {
            let query = self.settings.query_for(q);
            async move { self.search.search(&query).await }
        }))
        .await;

        let mut results = Vec::with_capacity(queries.len());
        for (query, lookup) in queries.iter().zip(lookups) {
            match lookup {
                Ok(hits) => results.push((query, hits)),
                Err(e) => {
                    tracing::warn!(%query, error = %e, "search failed");
                    return SEARCH_UNAVAILABLE.to_string();
                }
            }
        }

        let mut sections = Vec::with_capacity(results.len());
        for (query, hits) in results {
            let summary = if hits.is_empty() {
                NO_RESULTS.to_string()
            } else {
                self.summarize(query, &hits).await
            };
            sections.push(format!("=== {query} ===\n{summary}"));
        }
        sections.join("\n\n")
    }

    async fn summarize(&self, query: &str, hits: &[SearchHit]) -> String {
        let results = hits
            .iter()
            .map(|h| format!("{}: {}", h.title, h.content))
            .collect::<Vec<_>>()
            .join("\n");
        match self
            .llm
            .complete(&prompts::summarize(&self.lender, query, &results))
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(%query, error = %e, "summary failed");
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }
}

#[async_trait]
impl Node for SearchNode {
    fn id(&self) -> NodeId {
        NodeId::Search
    }

    async fn run(&self, state: &mut ConversationState) -> Result<()> {
        let pending = state.take_pending_queries();
        let queries = match self.query_source {
            QuerySource::Router => pending,
            QuerySource::SearchNode => self.generate_queries(state).await,
        };

        if queries.is_empty() {
            tracing::info!("no queries to search");
        } else {
            tracing::info!(count = queries.len(), "searching");
            state.search_digest = self.digest(&queries).await;
        }
        state.action = Next::Node(NodeId::Sales);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Speaker;
    use crate::testing::{FakeSearch, ScriptedLlm};
    use pretty_assertions::assert_eq;

    fn hit(content: &str) -> SearchHit {
        SearchHit {
            title: "Tata Capital".into(),
            url: "https://www.tatacapital.com".into(),
            content: content.into(),
            score: 0.8,
        }
    }

    fn node(llm: Arc<ScriptedLlm>, search: Arc<FakeSearch>, source: QuerySource) -> SearchNode {
        let config = GraphConfig {
            query_source: source,
            ..Default::default()
        };
        SearchNode::new(llm, search, &config)
    }

    #[tokio::test]
    async fn test_no_pending_queries_is_a_no_op() {
        let llm = Arc::new(ScriptedLlm::new());
        let search = Arc::new(FakeSearch::new());
        let mut state = ConversationState::new();

        node(llm.clone(), search.clone(), QuerySource::Router)
            .run(&mut state)
            .await
            .unwrap();

        assert!(state.search_digest.is_empty());
        assert!(search.calls().is_empty());
        assert!(llm.prompts().is_empty());
        assert_eq!(state.action, Next::Node(NodeId::Sales));
    }

    #[tokio::test]
    async fn test_digest_keeps_query_order_and_skips_empty_results() {
        let llm = Arc::new(
            ScriptedLlm::new().reply("Summarize the following search results", "- Fee: 2.5% of loan amount"),
        );
        let search = Arc::new(FakeSearch::new().hits("processing fee", vec![hit("2.5% fee")]));
        let mut state = ConversationState::new();
        state.pending_queries = vec!["prepayment charges".into(), "processing fee".into()];

        node(llm.clone(), search.clone(), QuerySource::Router)
            .run(&mut state)
            .await
            .unwrap();

        assert_eq!(
            state.search_digest,
            "=== prepayment charges ===\nNo specific information found.\n\n\
             === processing fee ===\n- Fee: 2.5% of loan amount"
        );
        assert!(state.pending_queries.is_empty());
        assert_eq!(llm.prompts().len(), 1);
        assert!(llm.prompts()[0].contains("Tata Capital: 2.5% fee"));

        let sent: Vec<String> = search.calls().into_iter().map(|q| q.query).collect();
        assert_eq!(sent.len(), 2);
        assert!(sent.contains(&"prepayment charges Tata Capital".to_string()));
        assert!(search.calls().iter().all(|q| q.max_results == 2 && q.topic == "finance"));
    }

    #[tokio::test]
    async fn test_search_failure_degrades_whole_digest() {
        let llm = Arc::new(ScriptedLlm::new());
        let search = Arc::new(FakeSearch::unavailable());
        let mut state = ConversationState::new();
        state.pending_queries = vec!["home loan rates".into(), "home loan fees".into()];

        node(llm.clone(), search, QuerySource::Router)
            .run(&mut state)
            .await
            .unwrap();

        assert_eq!(state.search_digest, SEARCH_UNAVAILABLE);
        assert!(state.pending_queries.is_empty());
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_summary_failure_marks_only_that_query() {
        let llm = Arc::new(ScriptedLlm::new().fail_on("Summarize the following search results"));
        let search = Arc::new(FakeSearch::new().hits("eligibility", vec![hit("age 21-58")]));
        let mut state = ConversationState::new();
        state.pending_queries = vec!["eligibility".into()];

        node(llm, search, QuerySource::Router)
            .run(&mut state)
            .await
            .unwrap();

        assert_eq!(state.search_digest, "=== eligibility ===\nSummary unavailable.");
    }

    #[tokio::test]
    async fn test_search_node_generates_its_own_queries() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .reply(
                    "search query generator",
                    r#"{"queries": ["personal loan eligibility", "personal loan documents"]}"#,
                )
                .reply("Summarize the following search results", "- summary"),
        );
        let search = Arc::new(FakeSearch::new());
        let mut state = ConversationState::new();
        state.history.push(Speaker::User, "Am I eligible, and what do I need to submit?");
        state.pending_queries = vec!["ignored".into()];

        node(llm, search.clone(), QuerySource::SearchNode)
            .run(&mut state)
            .await
            .unwrap();

        let mut sent: Vec<String> = search.calls().into_iter().map(|q| q.query).collect();
        sent.sort();
        assert_eq!(
            sent,
            vec![
                "personal loan documents Tata Capital".to_string(),
                "personal loan eligibility Tata Capital".to_string(),
            ]
        );
        assert!(state.pending_queries.is_empty());
    }

    #[tokio::test]
    async fn test_generated_query_falls_back_to_message() {
        let llm = Arc::new(ScriptedLlm::new().reply("search query generator", "sorry, no idea"));
        let search = Arc::new(FakeSearch::new());
        let mut state = ConversationState::new();
        state.history.push(Speaker::User, "gold loan rates");

        node(llm, search.clone(), QuerySource::SearchNode)
            .run(&mut state)
            .await
            .unwrap();

        let sent: Vec<String> = search.calls().into_iter().map(|q| q.query).collect();
        assert_eq!(sent, vec!["gold loan rates Tata Capital".to_string()]);
        assert_eq!(state.search_digest, "=== gold loan rates ===\nNo specific information found.");
    }
}
