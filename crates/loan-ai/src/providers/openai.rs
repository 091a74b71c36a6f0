//! OpenAI-compatible Chat Completions provider (OpenAI, Groq, OpenRouter, Ollama)

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    providers::LlmProvider,
    stream::{MessageEvent, MessageEventStream},
    types::{CompletionOptions, Context, Model, StopReason, Usage},
};

/// OpenAI-compatible API client
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl OpenAIProvider {
    /// Create a new provider with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: Some(api_key.into()),
        }
    }

    /// Create a provider that sends no Authorization header (local Ollama)
    pub fn without_auth() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: None,
        }
    }

    /// Create from the environment variable the model's provider uses
    pub fn from_env(model: &Model) -> Result<Self> {
        match model.provider.api_key_env_var() {
            Some(var) => {
                let api_key = std::env::var(var).map_err(|_| Error::InvalidApiKey)?;
                Ok(Self::new(api_key))
            }
            None => Ok(Self::without_auth()),
        }
    }

    fn build_headers(&self, model: &Model) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(ref key) = self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|_| Error::InvalidApiKey)?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        // Add model-specific headers
        for (key, value) in &model.headers {
            if let (Ok(name), Ok(val)) = (key.parse::<HeaderName>(), value.parse::<HeaderValue>()) {
                headers.insert(name, val);
            }
        }
        Ok(headers)
    }

    fn build_request(
        &self,
        model: &Model,
        context: &Context,
        options: &CompletionOptions,
    ) -> ChatRequest {
        ChatRequest {
            model: model.id.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: context.prompt.clone(),
            }],
            stream: true,
            max_tokens: Some(options.max_tokens.unwrap_or(model.max_tokens / 4)),
            temperature: options.temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    async fn stream(
        &self,
        model: &Model,
        context: &Context,
        options: &CompletionOptions,
    ) -> Result<MessageEventStream> {
        if model.base_url.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "model '{}' has no base URL",
                model.id
            )));
        }

        let request = self.build_request(model, context, options);
        let url = format!("{}/chat/completions", model.base_url.trim_end_matches('/'));
        let headers = self.build_headers(model)?;

        tracing::debug!(model = %model.id, %url, "starting chat completion");

        let request_builder = self.client.post(&url).headers(headers).json(&request);

        let event_source = EventSource::new(request_builder)
            .map_err(|e| Error::Sse(format!("Failed to create event source: {}", e)))?;

        Ok(Box::pin(create_stream(event_source, model.id.clone())))
    }
}

fn create_stream(
    mut event_source: EventSource,
    model_id: String,
) -> impl futures::Stream<Item = MessageEvent> {
    stream! {
        let mut accumulated_text = String::new();
        let mut finish_reason: Option<String> = None;
        let mut usage = Usage::default();

        yield MessageEvent::Start { model: model_id };

        while let Some(event) = event_source.next().await {
            match event {
                Ok(Event::Open) => {}
                Ok(Event::Message(msg)) => {
                    if msg.data == "[DONE]" {
                        break;
                    }

                    match serde_json::from_str::<StreamChunk>(&msg.data) {
                        Ok(chunk) => {
                            for choice in &chunk.choices {
                                if let Some(ref content) = choice.delta.content {
                                    accumulated_text.push_str(content);
                                    yield MessageEvent::TextDelta { delta: content.clone() };
                                }
                                if let Some(ref reason) = choice.finish_reason {
                                    finish_reason = Some(reason.clone());
                                }
                            }

                            // Groq reports usage under x_groq, OpenAI at top level
                            let chunk_usage = chunk
                                .usage
                                .as_ref()
                                .or(chunk.x_groq.as_ref().and_then(|x| x.usage.as_ref()));
                            if let Some(stream_usage) = chunk_usage {
                                usage.input = stream_usage.prompt_tokens;
                                usage.output = stream_usage.completion_tokens;
                            }
                        }
                        Err(e) => {
                            yield MessageEvent::Error {
                                message: format!("Failed to parse chunk: {}", e),
                            };
                            event_source.close();
                            return;
                        }
                    }
                }
                Err(reqwest_eventsource::Error::StreamEnded) => break,
                Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                    let body = response.text().await.unwrap_or_default();
                    yield MessageEvent::Error {
                        message: Error::from_status(status, body).to_string(),
                    };
                    event_source.close();
                    return;
                }
                Err(e) => {
                    yield MessageEvent::Error {
                        message: format!("SSE error: {}", e),
                    };
                    event_source.close();
                    return;
                }
            }
        }
        event_source.close();

        let stop_reason = match finish_reason.as_deref() {
            Some("length") => StopReason::Length,
            _ => StopReason::Stop,
        };

        yield MessageEvent::Done {
            text: accumulated_text,
            stop_reason,
            usage,
        };
    }
}

// Request types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

// Streaming response types

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    usage: Option<StreamUsage>,
    #[serde(default)]
    x_groq: Option<GroqExtension>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqExtension {
    usage: Option<StreamUsage>,
}

#[derive(Debug, Deserialize)]
struct StreamUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
