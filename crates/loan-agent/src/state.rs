//! Shared conversation state passed from node to node

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::Next;
use crate::profile::UserProfile;

/// Who produced an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Assistant,
    User,
    /// Notes folded into the transcript for the model's benefit
    System,
}

impl Speaker {
    /// Marker the transcript uses in front of this speaker's lines
    pub fn marker(&self) -> &'static str {
        match self {
            Speaker::Assistant => "Loan Assistant: ",
            Speaker::User => "User: ",
            Speaker::System => "[System Note: ",
        }
    }
}

/// One line of the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: Speaker,
    pub text: String,
}

impl fmt::Display for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.speaker {
            Speaker::System => write!(f, "{}{}]", self.speaker.marker(), self.text),
            _ => write!(f, "{}{}", self.speaker.marker(), self.text),
        }
    }
}

/// Append-only conversation transcript
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    lines: Vec<Utterance>,
}

impl Transcript {
    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.lines.push(Utterance {
            speaker,
            text: text.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Utterance> {
        self.lines.iter()
    }

    /// Utterances appended after the first `n`
    pub fn since(&self, n: usize) -> &[Utterance] {
        self.lines.get(n..).unwrap_or_default()
    }

    /// Text of the most recent user utterance
    pub fn last_user_message(&self) -> Option<&str> {
        self.lines
            .iter()
            .rev()
            .find(|u| u.speaker == Speaker::User)
            .map(|u| u.text.as_str())
    }

    /// Number of utterances by `speaker`
    pub fn count(&self, speaker: Speaker) -> usize {
        self.lines.iter().filter(|u| u.speaker == speaker).count()
    }

    /// The transcript as a single newline-separated string
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|u| u.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Everything the nodes share for one conversation.
///
/// Owned by the graph and lent to exactly one node at a time. Counters and
/// latches are private so they only ever move forward.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub history: Transcript,
    /// Where the last node wants control to go
    pub action: Next,
    /// Queries for the search node, consumed once
    pub pending_queries: Vec<String>,
    /// Search summary for the next sales turn, consumed once
    pub search_digest: String,
    /// EMI summary for the next sales turn, consumed once
    pub emi_digest: String,
    pub profile: UserProfile,
    turn_count: u32,
    user_id: Option<u64>,
    credit_checked: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// Count one more turn. Called by the nodes that speak.
    pub fn advance_turn(&mut self) {
        self.turn_count += 1;
    }

    pub fn user_id(&self) -> Option<u64> {
        self.user_id
    }

    /// Record the applicant's id. The first id seen wins; returns whether this
    /// call stored it.
    pub fn record_user_id(&mut self, id: u64) -> bool {
        if self.user_id.is_some() {
            return false;
        }
        self.user_id = Some(id);
        true
    }

    /// Whether the credit check already ran (successfully or not)
    pub fn credit_checked(&self) -> bool {
        self.credit_checked
    }

    /// Mark the credit check as done. Never unset.
    pub fn latch_credit_check(&mut self) {
        self.credit_checked = true;
    }

    /// Take the search digest, leaving it empty
    pub fn take_search_digest(&mut self) -> String {
        std::mem::take(&mut self.search_digest)
    }

    /// Take the EMI digest, leaving it empty
    pub fn take_emi_digest(&mut self) -> String {
        std::mem::take(&mut self.emi_digest)
    }

    /// Take the pending queries, leaving none
    pub fn take_pending_queries(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_queries)
    }
}
