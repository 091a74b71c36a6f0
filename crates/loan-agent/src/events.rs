//! Graph event types

use serde::{Deserialize, Serialize};

use crate::graph::{Next, NodeId};
use crate::state::Speaker;

/// Events emitted while a conversation runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphEvent {
    /// Conversation started
    ConversationStart { max_turns: u32 },

    /// A node is about to run
    NodeStart { node: NodeId, turn: u32 },

    /// A node finished and the graph picked its successor
    NodeEnd { node: NodeId, next: Next },

    /// A line was appended to the transcript
    Utterance { speaker: Speaker, text: String },

    /// Conversation finished
    ConversationEnd { turns: u32, steps: usize },

    /// A node failed and the conversation was aborted
    Error { node: NodeId, message: String },
}

impl GraphEvent {
    /// Check if this is a terminal event
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GraphEvent::ConversationEnd { .. } | GraphEvent::Error { .. }
        )
    }
}
