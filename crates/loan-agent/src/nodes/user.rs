//! Synthetic customer, standing in for a real person

use std::sync::Arc;

use async_trait::async_trait;
use loan_ai::TextCompletion;

use crate::error::Result;
use crate::graph::{Next, Node, NodeId};
use crate::persona::Persona;
use crate::prompts;
use crate::state::{ConversationState, Speaker};

/// Said when the model cannot produce the customer's line
pub const FALLBACK_USER_MESSAGE: &str = "Could you tell me more about the loan options you have for me?";

/// Plays a [`Persona`] with the language model
pub struct SyntheticUserNode {
    llm: Arc<dyn TextCompletion>,
    persona: Persona,
}

impl SyntheticUserNode {
    pub fn new(llm: Arc<dyn TextCompletion>, persona: &Persona) -> Self {
        Self {
            llm,
            persona: *persona,
        }
    }
}

/// Strip a speaker label the model sometimes echoes back
fn clean_reply(reply: &str) -> &str {
    let trimmed = reply.trim();
    trimmed
        .strip_prefix(Speaker::User.marker())
        .or_else(|| trimmed.strip_prefix("Customer: "))
        .unwrap_or(trimmed)
        .trim()
}

#[async_trait]
impl Node for SyntheticUserNode {
    fn id(&self) -> NodeId {
        NodeId::User
    }

    async fn run(&self, state: &mut ConversationState) -> Result<()> {
        let prompt = prompts::synthetic_user(&self.persona.description(), &state.history.render());
        let message = match self.llm.complete(&prompt).await {
            Ok(reply) if !clean_reply(&reply).is_empty() => clean_reply(&reply).to_string(),
            Ok(_) => FALLBACK_USER_MESSAGE.to_string(),
            Err(e) => {
                tracing::warn!(persona = self.persona.name, error = %e, "synthetic user failed, using fallback line");
                FALLBACK_USER_MESSAGE.to_string()
            }
        };

        state.history.push(Speaker::User, message);
        state.advance_turn();
        state.action = Next::Node(NodeId::Router);
        Ok(())
    }
}
