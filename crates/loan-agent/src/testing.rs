//! Scripted collaborators for unit tests

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use loan_ai::{SearchHit, SearchQuery, TextCompletion, WebSearch};
use parking_lot::Mutex;

use crate::credit::{CreditBureau, CreditReport};
use crate::error::{Error, Result};

struct Script {
    needle: String,
    replies: VecDeque<Option<String>>,
}

/// A language model that answers by prompt content.
///
/// Each script is keyed by a phrase the prompt must contain; the first
/// matching script (in registration order) answers. Replies are used in order
/// and the last one repeats. A `None` reply is a model failure.
#[derive(Default)]
pub struct ScriptedLlm {
    scripts: Mutex<Vec<Script>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, needle: &str, reply: Option<String>) -> Self {
        {
            let mut scripts = self.scripts.lock();
            match scripts.iter_mut().find(|s| s.needle == needle) {
                Some(script) => script.replies.push_back(reply),
                None => scripts.push(Script {
                    needle: needle.to_string(),
                    replies: VecDeque::from([reply]),
                }),
            }
        }
        self
    }

    /// Answer prompts containing `needle` with `reply`
    pub fn reply(self, needle: &str, reply: &str) -> Self {
        self.push(needle, Some(reply.to_string()))
    }

    /// Fail prompts containing `needle`
    pub fn fail_on(self, needle: &str) -> Self {
        self.push(needle, None)
    }

    /// Every prompt seen, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn prompts_matching(&self, needle: &str) -> Vec<String> {
        self.prompts
            .lock()
            .iter()
            .filter(|p| p.contains(needle))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TextCompletion for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> loan_ai::Result<String> {
        self.prompts.lock().push(prompt.to_string());

        let mut scripts = self.scripts.lock();
        let Some(script) = scripts.iter_mut().find(|s| prompt.contains(&s.needle)) else {
            return Err(loan_ai::Error::UnexpectedResponse(format!(
                "no scripted reply for prompt: {}",
                prompt.chars().take(80).collect::<String>()
            )));
        };
        let reply = if script.replies.len() > 1 {
            script.replies.pop_front().flatten()
        } else {
            script.replies.front().cloned().flatten()
        };
        reply.ok_or_else(|| loan_ai::Error::api("overloaded", "scripted failure"))
    }
}

/// A web search with canned hits per query
#[derive(Default)]
pub struct FakeSearch {
    hits: Vec<(String, Vec<SearchHit>)>,
    unavailable: bool,
    calls: Mutex<Vec<SearchQuery>>,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `hits` for queries containing `needle`
    pub fn hits(mut self, needle: &str, hits: Vec<SearchHit>) -> Self {
        self.hits.push((needle.to_string(), hits));
        self
    }

    /// Fail every query
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<SearchQuery> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl WebSearch for FakeSearch {
    async fn search(&self, query: &SearchQuery) -> loan_ai::Result<Vec<SearchHit>> {
        self.calls.lock().push(query.clone());
        if self.unavailable {
            return Err(loan_ai::Error::api("http_503", "search backend down"));
        }
        Ok(self
            .hits
            .iter()
            .find(|(needle, _)| query.query.contains(needle.as_str()))
            .map(|(_, hits)| hits.clone())
            .unwrap_or_default())
    }
}

/// A credit bureau with fixed answers, or none at all
#[derive(Default)]
pub struct FixedBureau {
    reports: HashMap<u64, CreditReport>,
}

impl FixedBureau {
    pub fn with(mut self, user_id: u64, credit_score: u32, pre_approved_amount: u64) -> Self {
        self.reports.insert(
            user_id,
            CreditReport {
                credit_score,
                pre_approved_amount,
            },
        );
        self
    }
}

impl CreditBureau for FixedBureau {
    fn credit_score(&self, user_id: u64) -> Result<u32> {
        self.reports
            .get(&user_id)
            .map(|r| r.credit_score)
            .ok_or_else(|| Error::credit_lookup(user_id, "bureau unavailable"))
    }

    fn pre_approved_amount(&self, user_id: u64) -> Result<u64> {
        self.reports
            .get(&user_id)
            .map(|r| r.pre_approved_amount)
            .ok_or_else(|| Error::credit_lookup(user_id, "bureau unavailable"))
    }
}
