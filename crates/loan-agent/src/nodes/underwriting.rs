//! The underwriting node: one credit check per conversation

use std::sync::Arc;

use async_trait::async_trait;

use crate::credit::CreditBureau;
use crate::emi::format_amount;
use crate::error::Result;
use crate::graph::{Next, Node, NodeId};
use crate::state::{ConversationState, Speaker};

/// Looks up credit score and pre-approved amount for the identified user
pub struct UnderwritingNode {
    credit: Arc<dyn CreditBureau>,
}

impl UnderwritingNode {
    pub fn new(credit: Arc<dyn CreditBureau>) -> Self {
        Self { credit }
    }
}

#[async_trait]
impl Node for UnderwritingNode {
    fn id(&self) -> NodeId {
        NodeId::Underwriting
    }

    async fn run(&self, state: &mut ConversationState) -> Result<()> {
        state.action = Next::Node(NodeId::Sales);

        let Some(user_id) = state.user_id().or(state.profile.user_id) else {
            tracing::warn!("underwriting reached without a user id");
            return Ok(());
        };
        state.record_user_id(user_id);

        match self.credit.report(user_id) {
            Ok(report) => {
                tracing::info!(
                    user_id,
                    credit_score = report.credit_score,
                    pre_approved_amount = report.pre_approved_amount,
                    "credit check completed"
                );
                state.profile.credit_score = Some(report.credit_score);
                state.profile.pre_approved_amount = Some(report.pre_approved_amount);
                state.history.push(
                    Speaker::System,
                    format!(
                        "Credit check completed - Score: {}, Pre-approved: ₹{}",
                        report.credit_score,
                        format_amount(report.pre_approved_amount as f64)
                    ),
                );
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "credit check failed");
                state
                    .history
                    .push(Speaker::System, "Unable to fetch credit information");
            }
        }
        state.latch_credit_check();
        Ok(())
    }
}
