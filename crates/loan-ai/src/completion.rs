//! Prompt-in, text-out completion

use std::sync::Arc;

use async_trait::async_trait;

use crate::providers::LlmProvider;
use crate::{CompletionOptions, Context, Model, Result, stream};

/// A language model seen as an opaque `complete(prompt) -> text` function.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Complete a single prompt
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// [`TextCompletion`] over a streaming chat provider
pub struct ChatCompleter {
    provider: Arc<dyn LlmProvider>,
    model: Model,
    options: CompletionOptions,
}

impl ChatCompleter {
    pub fn new(provider: Arc<dyn LlmProvider>, model: Model) -> Self {
        Self {
            provider,
            model,
            options: CompletionOptions::default(),
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }
}

#[async_trait]
impl TextCompletion for ChatCompleter {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let context = Context::from_prompt(prompt);
        let events = self
            .provider
            .stream(&self.model, &context, &self.options)
            .await?;
        let completion = stream::collect(events).await?;
        tracing::debug!(
            model = %self.model.id,
            input_tokens = completion.usage.input,
            output_tokens = completion.usage.output,
            "completion finished"
        );
        Ok(completion.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{MessageEvent, MessageEventStream};
    use crate::{Error, Provider, StopReason, Usage};
    use std::sync::Mutex;

    struct CannedProvider {
        events: Vec<MessageEvent>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn stream(
            &self,
            _model: &Model,
            context: &Context,
            _options: &CompletionOptions,
        ) -> Result<MessageEventStream> {
            self.seen.lock().unwrap().push(context.prompt.clone());
            Ok(Box::pin(futures::stream::iter(self.events.clone())))
        }
    }

    #[tokio::test]
    async fn test_complete_sends_prompt_and_trims_reply() {
        let provider = Arc::new(CannedProvider {
            events: vec![
                MessageEvent::TextDelta {
                    delta: "  {\"action\": \"sales_agent\"}\n".into(),
                },
                MessageEvent::Done {
                    text: String::new(),
                    stop_reason: StopReason::Stop,
                    usage: Usage::default(),
                },
            ],
            seen: Mutex::default(),
        });
        let completer = ChatCompleter::new(
            provider.clone(),
            Model::custom(Provider::Groq, "llama-3.1-8b-instant"),
        );

        let text = completer.complete("route this").await.unwrap();
        assert_eq!(text, "{\"action\": \"sales_agent\"}");
        assert_eq!(*provider.seen.lock().unwrap(), vec!["route this".to_string()]);
    }

    #[tokio::test]
    async fn test_complete_propagates_stream_error() {
        let provider = Arc::new(CannedProvider {
            events: vec![MessageEvent::Error {
                message: "quota exceeded".into(),
            }],
            seen: Mutex::default(),
        });
        let completer = ChatCompleter::new(provider, Model::custom(Provider::Groq, "x"));
        assert!(matches!(
            completer.complete("hi").await,
            Err(Error::Sse(_))
        ));
    }
}
