//! The conversation graph: node wiring, edge selection and the run loop

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use loan_ai::{TextCompletion, WebSearch};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::{DEFAULT_MAX_TURNS, GraphConfig};
use crate::credit::CreditBureau;
use crate::error::{Error, Result};
use crate::events::GraphEvent;
use crate::nodes::{EmiNode, RouterNode, SalesNode, SearchNode, UnderwritingNode};
use crate::state::ConversationState;

/// Identifies a node in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    #[serde(rename = "master_agent")]
    Router,
    #[serde(rename = "sales_agent")]
    Sales,
    #[serde(rename = "search_agent")]
    Search,
    #[serde(rename = "underwriting_agent")]
    Underwriting,
    #[serde(rename = "emi_calculator")]
    EmiCalculator,
    #[serde(rename = "user_agent")]
    User,
}

impl NodeId {
    pub const ALL: [NodeId; 6] = [
        NodeId::Router,
        NodeId::Sales,
        NodeId::Search,
        NodeId::Underwriting,
        NodeId::EmiCalculator,
        NodeId::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeId::Router => "master_agent",
            NodeId::Sales => "sales_agent",
            NodeId::Search => "search_agent",
            NodeId::Underwriting => "underwriting_agent",
            NodeId::EmiCalculator => "emi_calculator",
            NodeId::User => "user_agent",
        }
    }

    /// Parse a node name as models write it (`"search_agent"`, `"EMI_CALCULATOR"`)
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|id| id.as_str() == name)
    }

    /// Nodes this node may hand control to
    pub fn successors(&self) -> &'static [NodeId] {
        match self {
            NodeId::Router => &[
                NodeId::User,
                NodeId::Sales,
                NodeId::Search,
                NodeId::Underwriting,
                NodeId::EmiCalculator,
            ],
            NodeId::Sales => &[NodeId::User],
            NodeId::Search | NodeId::Underwriting | NodeId::EmiCalculator => &[NodeId::Sales],
            NodeId::User => &[NodeId::Router],
        }
    }

    /// Where control goes when a node asks for a destination it has no edge to
    fn fallback(&self) -> NodeId {
        match self {
            NodeId::Router => NodeId::Sales,
            other => other.successors()[0],
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where control goes after a node finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Next {
    Node(NodeId),
    End,
}

impl Default for Next {
    fn default() -> Self {
        Next::Node(NodeId::Sales)
    }
}

impl fmt::Display for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Next::Node(id) => id.fmt(f),
            Next::End => f.write_str("end"),
        }
    }
}

/// Pick the successor of `from`.
///
/// The turn budget is checked here and only here: once `turn_count` reaches
/// `max_turns` every edge leads to [`Next::End`]. Requests for a node `from`
/// has no edge to are redirected to its fallback.
pub fn select_edge(from: NodeId, requested: Next, turn_count: u32, max_turns: u32) -> Next {
    if turn_count >= max_turns {
        return Next::End;
    }
    match requested {
        Next::End => Next::End,
        Next::Node(to) if from.successors().contains(&to) => Next::Node(to),
        Next::Node(to) => {
            let fallback = from.fallback();
            tracing::warn!(%from, requested = %to, %fallback, "no such edge, using fallback");
            Next::Node(fallback)
        }
    }
}

/// A unit of work in the graph
#[async_trait]
pub trait Node: Send + Sync {
    fn id(&self) -> NodeId;

    /// Do this node's work and set `state.action` to the desired successor
    async fn run(&self, state: &mut ConversationState) -> Result<()>;
}

/// External services the built-in nodes talk to
#[derive(Clone)]
pub struct Collaborators {
    pub llm: Arc<dyn TextCompletion>,
    pub search: Arc<dyn WebSearch>,
    pub credit: Arc<dyn CreditBureau>,
}

/// Result of a finished conversation
#[derive(Debug, Clone)]
pub struct ConversationOutcome {
    pub state: ConversationState,
    /// Nodes in the order they ran
    pub steps: Vec<NodeId>,
}

impl ConversationOutcome {
    /// How many times `node` ran
    pub fn visits(&self, node: NodeId) -> usize {
        self.steps.iter().filter(|&&id| id == node).count()
    }
}

/// Collects nodes for a [`ConversationGraph`]
pub struct GraphBuilder {
    nodes: HashMap<NodeId, Arc<dyn Node>>,
    max_turns: u32,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Register a node under its own id, replacing any earlier one
    pub fn node(mut self, node: Arc<dyn Node>) -> Self {
        self.nodes.insert(node.id(), node);
        self
    }

    /// Finish the graph. Every [`NodeId`] must have a node.
    pub fn build(self) -> Result<ConversationGraph> {
        if let Some(missing) = NodeId::ALL.into_iter().find(|id| !self.nodes.contains_key(id)) {
            return Err(Error::MissingNode(missing));
        }
        let (event_tx, _) = broadcast::channel(256);
        Ok(ConversationGraph {
            nodes: self.nodes,
            max_turns: self.max_turns,
            event_tx,
        })
    }
}

/// Runs one conversation at a time through the node set
pub struct ConversationGraph {
    nodes: HashMap<NodeId, Arc<dyn Node>>,
    max_turns: u32,
    event_tx: broadcast::Sender<GraphEvent>,
}

impl ConversationGraph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// The loan sales graph: built-in router, sales, search, underwriting and
    /// EMI nodes around the given user node.
    pub fn loan_sales(
        collaborators: &Collaborators,
        user: Arc<dyn Node>,
        config: &GraphConfig,
    ) -> Result<Self> {
        let llm = collaborators.llm.clone();
        Self::builder()
            .max_turns(config.max_turns)
            .node(Arc::new(RouterNode::new(llm.clone(), config)))
            .node(Arc::new(SalesNode::new(llm.clone(), &config.lender_name)))
            .node(Arc::new(SearchNode::new(
                llm,
                collaborators.search.clone(),
                config,
            )))
            .node(Arc::new(UnderwritingNode::new(collaborators.credit.clone())))
            .node(Arc::new(EmiNode))
            .node(user)
            .build()
    }

    /// Subscribe to graph events
    pub fn subscribe(&self) -> broadcast::Receiver<GraphEvent> {
        self.event_tx.subscribe()
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    /// Drive `state` from the router until an edge leads to the end.
    ///
    /// A node error aborts the conversation and is returned as is.
    pub async fn run(&self, mut state: ConversationState) -> Result<ConversationOutcome> {
        let _ = self.event_tx.send(GraphEvent::ConversationStart {
            max_turns: self.max_turns,
        });
        tracing::info!(max_turns = self.max_turns, "conversation started");

        let mut steps = Vec::new();
        let mut next = select_edge(
            NodeId::User,
            Next::Node(NodeId::Router),
            state.turn_count(),
            self.max_turns,
        );

        while let Next::Node(id) = next {
            let node = self.nodes.get(&id).ok_or(Error::MissingNode(id))?;
            next = self.step(node.as_ref(), &mut state).await?;
            steps.push(id);
        }

        let _ = self.event_tx.send(GraphEvent::ConversationEnd {
            turns: state.turn_count(),
            steps: steps.len(),
        });
        tracing::info!(
            turns = state.turn_count(),
            steps = steps.len(),
            "conversation ended"
        );
        Ok(ConversationOutcome { state, steps })
    }

    /// Run one node and choose its successor
    async fn step(&self, node: &dyn Node, state: &mut ConversationState) -> Result<Next> {
        let id = node.id();
        let _ = self.event_tx.send(GraphEvent::NodeStart {
            node: id,
            turn: state.turn_count(),
        });
        tracing::debug!(node = %id, turn = state.turn_count(), "running node");

        let before = state.history.len();
        if let Err(e) = node.run(state).await {
            tracing::error!(node = %id, error = %e, "node failed");
            let _ = self.event_tx.send(GraphEvent::Error {
                node: id,
                message: e.to_string(),
            });
            return Err(e);
        }

        for line in state.history.since(before) {
            let _ = self.event_tx.send(GraphEvent::Utterance {
                speaker: line.speaker,
                text: line.text.clone(),
            });
        }

        let next = select_edge(id, state.action, state.turn_count(), self.max_turns);
        state.action = next;
        let _ = self.event_tx.send(GraphEvent::NodeEnd { node: id, next });
        tracing::info!(node = %id, %next, turn = state.turn_count(), "node finished");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::StaticCreditBureau;
    use crate::nodes::SyntheticUserNode;
    use crate::persona::find_persona;
    use crate::state::Speaker;
    use crate::testing::{FakeSearch, ScriptedLlm};
    use loan_ai::SearchHit;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_turn_cap_ends_every_edge() {
        for from in NodeId::ALL {
            assert_eq!(select_edge(from, Next::Node(NodeId::Sales), 6, 6), Next::End);
            assert_eq!(select_edge(from, Next::Node(NodeId::Sales), 7, 6), Next::End);
        }
    }

    #[test]
    fn test_allowed_edges_pass_through() {
        assert_eq!(
            select_edge(NodeId::Router, Next::Node(NodeId::Underwriting), 1, 6),
            Next::Node(NodeId::Underwriting)
        );
        assert_eq!(
            select_edge(NodeId::User, Next::Node(NodeId::Router), 1, 6),
            Next::Node(NodeId::Router)
        );
        assert_eq!(select_edge(NodeId::Sales, Next::End, 1, 6), Next::End);
    }

    #[test]
    fn test_illegal_edges_fall_back() {
        // Router cannot route to itself
        assert_eq!(
            select_edge(NodeId::Router, Next::Node(NodeId::Router), 1, 6),
            Next::Node(NodeId::Sales)
        );
        // Leaf agents always return to sales
        assert_eq!(
            select_edge(NodeId::Search, Next::Node(NodeId::User), 1, 6),
            Next::Node(NodeId::Sales)
        );
        assert_eq!(
            select_edge(NodeId::Sales, Next::Node(NodeId::Search), 1, 6),
            Next::Node(NodeId::User)
        );
    }

    #[test]
    fn test_node_id_parse() {
        assert_eq!(NodeId::parse(" EMI_Calculator "), Some(NodeId::EmiCalculator));
        assert_eq!(NodeId::parse("search_agent"), Some(NodeId::Search));
        assert_eq!(NodeId::parse("search"), None);
        assert_eq!(
            serde_json::to_string(&Next::Node(NodeId::Router)).unwrap(),
            r#"{"node":"master_agent"}"#
        );
    }

    #[test]
    fn test_builder_reports_missing_node() {
        let result = GraphBuilder::new().node(Arc::new(EmiNode)).build();
        assert!(matches!(result, Err(Error::MissingNode(NodeId::Router))));
    }

    fn scripted_conversation() -> ScriptedLlm {
        ScriptedLlm::new()
            // Synthetic customer, one reply per turn
            .reply(
                "Respond as the customer",
                "Hi, I'm Anita Sharma, user id 2. I need a personal loan for my child's education.",
            )
            .reply(
                "Respond as the customer",
                "What are your personal loan interest rates and processing fees?",
            )
            .reply(
                "Respond as the customer",
                "What would the EMI be for 5 lakh at 10% over 24 months?",
            )
            // Profile extraction
            .reply(
                "extract loan-application details",
                r#"{"name": "Anita Sharma", "user_id": 2, "loan_type": "personal"}"#,
            )
            .reply(
                "maintain a loan applicant's profile",
                r#"{"name": "Anita Sharma", "user_id": 2, "loan_type": "personal"}"#,
            )
            .reply(
                "maintain a loan applicant's profile",
                r#"{"name": "Anita Sharma", "user_id": 2, "loan_type": "personal", "loan_amount": 500000, "interest_rate": 10, "tenure": 24}"#,
            )
            // Routing
            .reply(
                "routing agent",
                r#"{"action": "search_agent", "queries": ["personal loan interest rates", "personal loan processing fees"]}"#,
            )
            .reply("routing agent", r#"{"action": "emi_calculator", "queries": []}"#)
            .reply("Summarize the following search results", "- Rates from 10.99% p.a.")
            .reply("Generate your reply now", "Happy to help with that.")
    }

    #[tokio::test]
    async fn test_full_conversation_runs_to_turn_cap() {
        let llm = Arc::new(scripted_conversation());
        let search = Arc::new(FakeSearch::new().hits(
            "personal loan interest rates",
            vec![SearchHit {
                title: "Personal Loan".into(),
                url: "https://www.tatacapital.com/personal-loan.html".into(),
                content: "Interest rates starting at 10.99% p.a.".into(),
                score: 0.9,
            }],
        ));
        let collaborators = Collaborators {
            llm: llm.clone(),
            search: search.clone(),
            credit: Arc::new(StaticCreditBureau::from_personas()),
        };
        let persona = find_persona(2).unwrap();
        let user = Arc::new(SyntheticUserNode::new(llm.clone(), persona));
        let graph =
            ConversationGraph::loan_sales(&collaborators, user, &GraphConfig::default()).unwrap();
        let mut events = graph.subscribe();

        let outcome = graph.run(ConversationState::new()).await.unwrap();

        use NodeId::*;
        assert_eq!(
            outcome.steps,
            vec![
                Router, User, Router, Underwriting, Sales, User, Router, Search, Sales, User,
                Router, EmiCalculator, Sales,
            ]
        );
        assert_eq!(outcome.visits(Underwriting), 1);

        let state = &outcome.state;
        assert_eq!(state.turn_count(), 6);
        assert_eq!(state.action, Next::End);
        assert!(state.credit_checked());
        assert_eq!(state.user_id(), Some(2));
        assert_eq!(state.profile.credit_score, Some(765));
        assert_eq!(state.profile.pre_approved_amount, Some(850000));
        assert_eq!(state.profile.loan_tenure, Some(24));
        assert!(state.search_digest.is_empty());
        assert!(state.emi_digest.is_empty());
        assert!(state.pending_queries.is_empty());

        let first = state.history.iter().next().unwrap();
        assert_eq!(first.speaker, Speaker::Assistant);
        assert!(first.text.starts_with("Hello! Welcome to Tata Capital"));
        assert_eq!(state.history.count(Speaker::User), 3);
        assert_eq!(state.history.count(Speaker::Assistant), 4);
        assert_eq!(state.history.count(Speaker::System), 1);

        // Sales saw each digest exactly once
        let sales_prompts = llm.prompts_matching("Generate your reply now");
        assert_eq!(sales_prompts.len(), 3);
        assert!(!sales_prompts[0].contains("10.99"));
        assert!(sales_prompts[1].contains("Rates from 10.99% p.a."));
        assert!(!sales_prompts[1].contains("Monthly EMI"));
        assert!(sales_prompts[2].contains("Monthly EMI: ₹23,072"));
        assert!(!sales_prompts[2].contains("Rates from 10.99% p.a."));

        // Empty result set for the second query is not summarized
        assert_eq!(llm.prompts_matching("Summarize the following search results").len(), 1);
        assert_eq!(search.calls().len(), 2);

        let mut saw_start = false;
        let mut last = None;
        while let Ok(event) = events.try_recv() {
            if matches!(event, GraphEvent::ConversationStart { max_turns: 6 }) {
                saw_start = true;
            }
            last = Some(event);
        }
        assert!(saw_start);
        assert!(matches!(
            last,
            Some(GraphEvent::ConversationEnd { turns: 6, steps: 13 })
        ));
    }

    #[tokio::test]
    async fn test_sales_failure_aborts_conversation() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .reply("Respond as the customer", "Tell me about home loans.")
                .reply("extract loan-application details", "{}")
                .reply("routing agent", r#"{"action": "sales_agent", "queries": []}"#)
                .fail_on("Generate your reply now"),
        );
        let collaborators = Collaborators {
            llm: llm.clone(),
            search: Arc::new(FakeSearch::new()),
            credit: Arc::new(StaticCreditBureau::from_personas()),
        };
        let user = Arc::new(SyntheticUserNode::new(llm, find_persona(1).unwrap()));
        let graph =
            ConversationGraph::loan_sales(&collaborators, user, &GraphConfig::default()).unwrap();
        let mut events = graph.subscribe();

        let result = graph.run(ConversationState::new()).await;
        assert!(matches!(result, Err(Error::Ai(_))));

        let mut error_node = None;
        while let Ok(event) = events.try_recv() {
            if let GraphEvent::Error { node, .. } = event {
                error_node = Some(node);
            }
        }
        assert_eq!(error_node, Some(NodeId::Sales));
    }

    #[tokio::test]
    async fn test_zero_turn_budget_runs_nothing() {
        let llm = Arc::new(ScriptedLlm::new());
        let collaborators = Collaborators {
            llm: llm.clone(),
            search: Arc::new(FakeSearch::new()),
            credit: Arc::new(StaticCreditBureau::from_personas()),
        };
        let user = Arc::new(SyntheticUserNode::new(llm.clone(), find_persona(3).unwrap()));
        let config = GraphConfig {
            max_turns: 0,
            ..Default::default()
        };
        let graph = ConversationGraph::loan_sales(&collaborators, user, &config).unwrap();

        let outcome = graph.run(ConversationState::new()).await.unwrap();
        assert!(outcome.steps.is_empty());
        assert!(outcome.state.history.is_empty());
        assert!(llm.prompts().is_empty());
    }
}
