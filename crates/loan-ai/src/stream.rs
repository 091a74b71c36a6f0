//! Streaming event types and utilities

use crate::error::{Error, Result};
use crate::types::{StopReason, Usage};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// Events emitted while a completion streams in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageEvent {
    /// Response started
    Start { model: String },
    /// Text content delta
    TextDelta { delta: String },
    /// Completion finished successfully
    Done {
        text: String,
        stop_reason: StopReason,
        usage: Usage,
    },
    /// Error occurred
    Error { message: String },
}

impl MessageEvent {
    /// Check if this is a terminal event (Done or Error)
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageEvent::Done { .. } | MessageEvent::Error { .. })
    }
}

/// A stream of message events
pub type MessageEventStream = Pin<Box<dyn Stream<Item = MessageEvent> + Send>>;

/// Accumulates text deltas into a final completion
#[derive(Debug, Default)]
pub struct TextAccumulator {
    text: String,
    finished: Option<(StopReason, Usage)>,
}

/// A finished completion
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

impl TextAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one event. Returns an error for `MessageEvent::Error`.
    pub fn process_event(&mut self, event: MessageEvent) -> Result<()> {
        match event {
            MessageEvent::Start { .. } => {}
            MessageEvent::TextDelta { delta } => self.text.push_str(&delta),
            MessageEvent::Done {
                text,
                stop_reason,
                usage,
            } => {
                // Providers repeat the full text on Done; prefer it when present.
                if !text.is_empty() {
                    self.text = text;
                }
                self.finished = Some((stop_reason, usage));
            }
            MessageEvent::Error { message } => return Err(Error::Sse(message)),
        }
        Ok(())
    }

    /// Build the final completion
    pub fn finish(self) -> Result<Completion> {
        if self.text.trim().is_empty() {
            return Err(Error::EmptyCompletion);
        }
        let (stop_reason, usage) = self.finished.unwrap_or((StopReason::Stop, Usage::default()));
        Ok(Completion {
            text: self.text,
            stop_reason,
            usage,
        })
    }
}

/// Drain a stream into a single completion
pub async fn collect(mut stream: MessageEventStream) -> Result<Completion> {
    let mut acc = TextAccumulator::new();
    while let Some(event) = stream.next().await {
        let terminal = event.is_terminal();
        acc.process_event(event)?;
        if terminal {
            break;
        }
    }
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_of(events: Vec<MessageEvent>) -> MessageEventStream {
        Box::pin(futures::stream::iter(events))
    }

    #[tokio::test]
    async fn test_collect_concatenates_deltas() {
        let events = vec![
            MessageEvent::Start {
                model: "m".into(),
            },
            MessageEvent::TextDelta {
                delta: "Hello, ".into(),
            },
            MessageEvent::TextDelta {
                delta: "world".into(),
            },
            MessageEvent::Done {
                text: String::new(),
                stop_reason: StopReason::Stop,
                usage: Usage { input: 3, output: 2 },
            },
        ];
        let completion = collect(stream_of(events)).await.unwrap();
        assert_eq!(completion.text, "Hello, world");
        assert_eq!(completion.usage.output, 2);
    }

    #[tokio::test]
    async fn test_collect_surfaces_stream_error() {
        let events = vec![
            MessageEvent::TextDelta {
                delta: "partial".into(),
            },
            MessageEvent::Error {
                message: "connection reset".into(),
            },
        ];
        let err = collect(stream_of(events)).await.unwrap_err();
        assert!(matches!(err, Error::Sse(m) if m == "connection reset"));
    }

    #[tokio::test]
    async fn test_collect_rejects_blank_completion() {
        let events = vec![MessageEvent::Done {
            text: "   ".into(),
            stop_reason: StopReason::Stop,
            usage: Usage::default(),
        }];
        let err = collect(stream_of(events)).await.unwrap_err();
        assert!(matches!(err, Error::EmptyCompletion));
    }

    #[tokio::test]
    async fn test_collect_without_done_keeps_text() {
        let events = vec![MessageEvent::TextDelta {
            delta: "no terminator".into(),
        }];
        let completion = collect(stream_of(events)).await.unwrap();
        assert_eq!(completion.text, "no terminator");
        assert_eq!(completion.stop_reason, StopReason::Stop);
    }
}
