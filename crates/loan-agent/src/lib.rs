//! loan-agent: conversation graph for the loan sales assistant
//!
//! A fixed set of agent nodes (router, sales, search, underwriting, EMI and the
//! user turn) share one [`ConversationState`]. The [`ConversationGraph`] runs
//! one node at a time, picks the next node from an explicit edge table and
//! stops once the turn budget is spent.

pub mod config;
pub mod credit;
pub mod emi;
pub mod error;
pub mod events;
pub mod extractor;
pub mod graph;
pub mod json;
pub mod nodes;
pub mod persona;
pub mod profile;
pub mod prompts;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{GraphConfig, QuerySource, SearchSettings};
pub use credit::{CreditBureau, CreditReport, StaticCreditBureau};
pub use error::{Error, Result};
pub use events::GraphEvent;
pub use extractor::ProfileExtractor;
pub use graph::{
    Collaborators, ConversationGraph, ConversationOutcome, GraphBuilder, Next, Node, NodeId,
};
pub use persona::Persona;
pub use profile::UserProfile;
pub use state::{ConversationState, Speaker, Transcript, Utterance};
