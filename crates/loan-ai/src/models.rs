//! Model registry with a small built-in table and public lookup API.

use std::collections::HashMap;

use crate::{Model, Provider};

struct ModelEntry {
    id: &'static str,
    name: &'static str,
    provider: Provider,
    context_window: u32,
    max_tokens: u32,
}

/// The model used when nothing else is configured.
pub const DEFAULT_MODEL_ID: &str = "llama-3.1-8b-instant";

const MODEL_ENTRIES: &[ModelEntry] = &[
    ModelEntry {
        id: "llama-3.1-8b-instant",
        name: "Llama 3.1 8B Instant",
        provider: Provider::Groq,
        context_window: 131_072,
        max_tokens: 8192,
    },
    ModelEntry {
        id: "llama-3.3-70b-versatile",
        name: "Llama 3.3 70B Versatile",
        provider: Provider::Groq,
        context_window: 131_072,
        max_tokens: 32_768,
    },
    ModelEntry {
        id: "gpt-4o-mini",
        name: "GPT-4o mini",
        provider: Provider::OpenAI,
        context_window: 128_000,
        max_tokens: 16_384,
    },
];

impl ModelEntry {
    fn to_model(&self) -> Model {
        Model {
            id: self.id.to_string(),
            name: self.name.to_string(),
            provider: self.provider,
            base_url: self.provider.default_base_url().to_string(),
            context_window: self.context_window,
            max_tokens: self.max_tokens,
            headers: HashMap::new(),
        }
    }
}

/// Look up a model by provider and ID.
pub fn get_model(provider: Provider, id: &str) -> Option<Model> {
    MODEL_ENTRIES
        .iter()
        .find(|e| e.id == id && e.provider == provider)
        .map(|e| e.to_model())
}

/// Look up a model by ID only (first match across all providers).
pub fn get_model_by_id(id: &str) -> Option<Model> {
    MODEL_ENTRIES
        .iter()
        .find(|e| e.id == id)
        .map(|e| e.to_model())
}

/// Get all models for a specific provider.
pub fn get_models(provider: Provider) -> Vec<Model> {
    MODEL_ENTRIES
        .iter()
        .filter(|e| e.provider == provider)
        .map(|e| e.to_model())
        .collect()
}

/// Resolve a model for a provider, falling back to an unregistered model
/// pointed at the provider's default endpoint.
pub fn resolve(provider: Provider, id: &str) -> Model {
    get_model(provider, id).unwrap_or_else(|| Model::custom(provider, id))
}
