//! Error types for loan-agent

use thiserror::Error;

use crate::graph::NodeId;

/// Result type alias using loan-agent Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the conversation graph
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the model or search layer
    #[error(transparent)]
    Ai(#[from] loan_ai::Error),

    /// The credit bureau could not answer for this user
    #[error("Credit lookup failed for user {user_id}: {reason}")]
    CreditLookup { user_id: u64, reason: String },

    /// The graph was built without a node it needs
    #[error("No node registered for {0}")]
    MissingNode(NodeId),
}

impl Error {
    pub fn credit_lookup(user_id: u64, reason: impl Into<String>) -> Self {
        Self::CreditLookup {
            user_id,
            reason: reason.into(),
        }
    }
}
