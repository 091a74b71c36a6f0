//! Configuration file support

use loan_agent::{QuerySource, SearchSettings};
use loan_ai::Provider;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for loan-assist
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default provider (groq, openai, openrouter, ollama)
    pub provider: Option<String>,
    /// Default model
    pub model: Option<String>,
    /// Synthetic customer persona id
    pub persona: Option<u64>,
    /// Turn budget per conversation
    pub max_turns: Option<u32>,
    /// Who writes search queries
    pub query_source: Option<QuerySource>,
    /// API keys (alternative to environment variables)
    #[serde(default)]
    pub api_keys: ApiKeys,
    /// Search scoping
    pub search: Option<SearchSettings>,
}

/// API key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeys {
    pub groq: Option<String>,
    pub openai: Option<String>,
    pub openrouter: Option<String>,
    pub tavily: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("loan-assist")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("LOAN_ASSIST_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), "Failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            provider: Some("groq".to_string()),
            model: Some(loan_ai::models::DEFAULT_MODEL_ID.to_string()),
            persona: Some(loan_agent::persona::DEFAULT_PERSONA_ID),
            max_turns: Some(loan_agent::config::DEFAULT_MAX_TURNS),
            query_source: Some(QuerySource::Router),
            api_keys: ApiKeys::default(),
            search: Some(SearchSettings::default()),
        };

        default_config.save()?;
        Ok(path)
    }

    /// Get the API key for a model provider, checking config then env
    pub fn get_api_key(&self, provider: Provider) -> Option<String> {
        let from_config = match provider {
            Provider::Groq => self.api_keys.groq.clone(),
            Provider::OpenAI => self.api_keys.openai.clone(),
            Provider::OpenRouter => self.api_keys.openrouter.clone(),
            Provider::Ollama | Provider::Custom => None,
        };

        if from_config.is_some() {
            return from_config;
        }

        provider
            .api_key_env_var()
            .and_then(|var| std::env::var(var).ok())
    }

    /// Get the Tavily key, checking config then env
    pub fn get_search_api_key(&self) -> Option<String> {
        self.api_keys
            .tavily
            .clone()
            .or_else(|| std::env::var("TAVILY_API_KEY").ok())
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# loan-assist configuration file
# Place at ~/.config/loan-assist/config.toml (Linux) or set LOAN_ASSIST_CONFIG_PATH

# Model provider (groq, openai, openrouter, ollama)
provider = "groq"

# Model to use
model = "llama-3.1-8b-instant"

# Synthetic customer persona (1-5, see --list-personas)
persona = 2

# Conversation turn budget
max_turns = 6

# Who writes search queries: "router" or "search_node"
query_source = "router"

# API keys (optional - environment variables and .env files also work)
[api_keys]
# groq = "gsk_..."
# openai = "sk-..."
# tavily = "tvly-..."

[search]
include_domains = ["tatacapital.com"]
max_results = 2
topic = "finance"
search_depth = "advanced"
query_suffix = " Tata Capital"
"#
}
