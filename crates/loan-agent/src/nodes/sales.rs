//! The sales node: the assistant's side of the conversation

use std::sync::Arc;

use async_trait::async_trait;
use loan_ai::TextCompletion;

use crate::emi::format_amount;
use crate::error::Result;
use crate::graph::{Next, Node, NodeId};
use crate::prompts::{self, SalesContext};
use crate::state::{ConversationState, Speaker};

/// Produces the assistant's turn from the transcript, profile and any digests
pub struct SalesNode {
    llm: Arc<dyn TextCompletion>,
    lender: String,
}

impl SalesNode {
    pub fn new(llm: Arc<dyn TextCompletion>, lender: &str) -> Self {
        Self {
            llm,
            lender: lender.to_string(),
        }
    }
}

#[async_trait]
impl Node for SalesNode {
    fn id(&self) -> NodeId {
        NodeId::Sales
    }

    /// Model errors propagate: there is no safe canned sales reply.
    async fn run(&self, state: &mut ConversationState) -> Result<()> {
        let search_digest = state.take_search_digest();
        let emi_digest = state.take_emi_digest();
        let transcript = state.history.render();
        let profile = state.profile.to_json_pretty();
        let pre_approved = state
            .profile
            .pre_approved_amount
            .map(|amount| format_amount(amount as f64));

        let prompt = prompts::sales(SalesContext {
            lender: &self.lender,
            transcript: &transcript,
            profile: &profile,
            credit_score: state.profile.credit_score,
            pre_approved_amount: pre_approved.as_deref(),
            search_digest: &search_digest,
            emi_digest: &emi_digest,
        });
        tracing::debug!(
            has_search = !search_digest.is_empty(),
            has_emi = !emi_digest.is_empty(),
            "sales prompt built"
        );

        let reply = self.llm.complete(&prompt).await?;
        state.history.push(Speaker::Assistant, reply);
        state.advance_turn();
        state.action = Next::Node(NodeId::User);
        Ok(())
    }
}
