//! The routing ("master") node

use std::sync::Arc;

use async_trait::async_trait;
use loan_ai::TextCompletion;
use serde_json::{Map, Value};

use crate::config::{GraphConfig, QuerySource};
use crate::emi::EmiInputs;
use crate::error::Result;
use crate::extractor::ProfileExtractor;
use crate::graph::{Next, Node, NodeId};
use crate::json::parse_json_object;
use crate::profile::UserProfile;
use crate::prompts;
use crate::state::{ConversationState, Speaker};

/// Greets, keeps the profile current, and decides who handles each message
pub struct RouterNode {
    llm: Arc<dyn TextCompletion>,
    extractor: ProfileExtractor,
    greeting: String,
    lender: String,
    query_source: QuerySource,
}

/// The model's routing reply
#[derive(Debug, Default)]
struct RouteChoice {
    action: String,
    queries: Vec<String>,
    reason: Option<String>,
}

impl RouteChoice {
    /// Read each key on its own so a badly shaped `queries` or `reason` never
    /// costs a usable `action`.
    fn from_map(map: &Map<String, Value>) -> Self {
        let queries = match map.get("queries") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(query)) => vec![query.clone()],
            _ => Vec::new(),
        };
        Self {
            action: map
                .get("action")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            queries,
            reason: map.get("reason").and_then(Value::as_str).map(str::to_string),
        }
    }
}

impl RouterNode {
    pub fn new(llm: Arc<dyn TextCompletion>, config: &GraphConfig) -> Self {
        Self {
            extractor: ProfileExtractor::new(llm.clone()),
            llm,
            greeting: config.greeting.clone(),
            lender: config.lender_name.clone(),
            query_source: config.query_source,
        }
    }

    /// Ask the model where `message` should go. Anything unusable means sales.
    async fn classify(&self, message: &str, profile: &UserProfile) -> (NodeId, Vec<String>) {
        let prompt = prompts::routing(&self.lender, message, &profile.to_json_pretty());
        let reply = match self.llm.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, retryable = e.is_retryable(), "routing call failed, defaulting to sales");
                return (NodeId::Sales, Vec::new());
            }
        };
        tracing::debug!(%reply, "routing reply");

        let Some(choice) = parse_json_object(&reply).map(|map| RouteChoice::from_map(&map)) else {
            tracing::warn!("unparsable routing reply, defaulting to sales");
            return (NodeId::Sales, Vec::new());
        };

        let target = match NodeId::parse(&choice.action) {
            Some(id @ (NodeId::Search | NodeId::EmiCalculator | NodeId::Sales)) => id,
            _ => {
                tracing::warn!(action = %choice.action, "unknown routing action, defaulting to sales");
                NodeId::Sales
            }
        };
        if let Some(reason) = &choice.reason {
            tracing::debug!(%target, %reason, "routing reason");
        }
        (target, choice.queries)
    }
}

/// Downgrade a classification whose preconditions do not hold
fn check_preconditions(target: NodeId, profile: &UserProfile) -> NodeId {
    if target == NodeId::EmiCalculator {
        if let Err(e) = EmiInputs::from_profile(profile) {
            tracing::warn!(reason = %e, "EMI requested without usable inputs, routing to sales");
            return NodeId::Sales;
        }
    }
    target
}

#[async_trait]
impl Node for RouterNode {
    fn id(&self) -> NodeId {
        NodeId::Router
    }

    async fn run(&self, state: &mut ConversationState) -> Result<()> {
        if state.history.is_empty() {
            state.history.push(Speaker::Assistant, self.greeting.as_str());
            state.action = Next::Node(NodeId::User);
            return Ok(());
        }

        let Some(message) = state.history.last_user_message().map(str::to_string) else {
            state.action = Next::Node(NodeId::User);
            return Ok(());
        };

        state.profile = self.extractor.extract_or_merge(&message, &state.profile).await;
        if let Some(id) = state.profile.user_id {
            if state.record_user_id(id) {
                tracing::info!(user_id = id, "user identified");
            }
        }

        if state.user_id().is_some() && !state.credit_checked() {
            tracing::info!(user_id = ?state.user_id(), "credit check pending, routing to underwriting");
            state.pending_queries.clear();
            state.action = Next::Node(NodeId::Underwriting);
            return Ok(());
        }

        let (target, queries) = self.classify(&message, &state.profile).await;
        let target = check_preconditions(target, &state.profile);

        state.pending_queries = match (target, self.query_source) {
            (NodeId::Search, QuerySource::Router) => queries
                .into_iter()
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .collect(),
            _ => Vec::new(),
        };
        tracing::info!(%target, queries = state.pending_queries.len(), "routed");
        state.action = Next::Node(target);
        Ok(())
    }
}
