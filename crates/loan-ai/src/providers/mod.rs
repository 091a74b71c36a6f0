//! Model provider implementations

pub mod openai;

use crate::{CompletionOptions, Context, MessageEventStream, Model, Result};
use async_trait::async_trait;

/// Trait for chat-completion providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stream a response from the model
    async fn stream(
        &self,
        model: &Model,
        context: &Context,
        options: &CompletionOptions,
    ) -> Result<MessageEventStream>;
}
