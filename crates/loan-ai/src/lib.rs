//! loan-ai: external service clients for the loan sales assistant
//!
//! This crate wraps the two collaborators the conversation graph talks to over
//! the network: a chat-completions language model and a web search API.

pub mod completion;
pub mod error;
pub mod models;
pub mod providers;
pub mod search;
pub mod stream;
pub mod types;

pub use completion::{ChatCompleter, TextCompletion};
pub use error::{Error, Result};
pub use search::{SearchHit, SearchQuery, WebSearch};
pub use stream::MessageEventStream;
pub use types::*;
