//! Free text to structured profile, via the language model

use std::sync::Arc;

use loan_ai::TextCompletion;

use crate::json::parse_json_object;
use crate::profile::UserProfile;
use crate::prompts;

/// Turns customer messages into [`UserProfile`] updates
#[derive(Clone)]
pub struct ProfileExtractor {
    llm: Arc<dyn TextCompletion>,
}

impl ProfileExtractor {
    pub fn new(llm: Arc<dyn TextCompletion>) -> Self {
        Self { llm }
    }

    /// Merge whatever `message` says into `current` and return the result.
    ///
    /// Never fails: a model error or a reply without a usable JSON object
    /// leaves the profile as it was.
    pub async fn extract_or_merge(&self, message: &str, current: &UserProfile) -> UserProfile {
        let prompt = if current.is_empty() {
            prompts::profile_create(message)
        } else {
            prompts::profile_update(message, &current.to_json_pretty())
        };

        let reply = match self.llm.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "profile extraction failed, keeping profile");
                return current.clone();
            }
        };
        tracing::debug!(%reply, "profile extraction reply");

        match parse_json_object(&reply) {
            Some(map) => current.merged(UserProfile::from_json_map(map)),
            None => {
                tracing::warn!("no JSON object in profile reply, keeping profile");
                current.clone()
            }
        }
    }
}
