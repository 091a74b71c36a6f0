//! The EMI node

use async_trait::async_trait;

use crate::emi::{EMI_UNAVAILABLE, EmiBreakdown, EmiInputs};
use crate::error::Result;
use crate::graph::{Next, Node, NodeId};
use crate::state::ConversationState;

/// Computes the installment for the loan in the profile
pub struct EmiNode;

#[async_trait]
impl Node for EmiNode {
    fn id(&self) -> NodeId {
        NodeId::EmiCalculator
    }

    async fn run(&self, state: &mut ConversationState) -> Result<()> {
        state.emi_digest = match EmiInputs::from_profile(&state.profile) {
            Ok(inputs) => {
                let breakdown = EmiBreakdown::calculate(inputs);
                tracing::info!(emi = breakdown.emi, tenure = inputs.tenure_months, "EMI calculated");
                breakdown.to_digest()
            }
            Err(e) => {
                tracing::warn!(reason = %e, "cannot calculate EMI");
                EMI_UNAVAILABLE.to_string()
            }
        };
        state.action = Next::Node(NodeId::Sales);
        Ok(())
    }
}
