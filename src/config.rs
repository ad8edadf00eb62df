use anyhow::{Context, Result};
use std::net::SocketAddr;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    #[default]
    Groq,
    Huggingface,
    Openrouter,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Groq => write!(f, "groq"),
            LlmProvider::Huggingface => write!(f, "huggingface"),
            LlmProvider::Openrouter => write!(f, "openrouter"),
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(LlmProvider::Groq),
            "huggingface" | "hf" => Ok(LlmProvider::Huggingface),
            "openrouter" => Ok(LlmProvider::Openrouter),
            other => anyhow::bail!("Unknown LLM_PROVIDER '{}'", other),
        }
    }
}

impl LlmProvider {
    /// Canonical OpenAI-compatible base URL for the provider.
    pub fn default_base_url(self) -> &'static str {
        match self {
            LlmProvider::Groq => "https://api.groq.com/openai/v1",
            LlmProvider::Huggingface => "https://router.huggingface.co/v1",
            LlmProvider::Openrouter => "https://openrouter.ai/api/v1",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::Groq => "gemma2-9b-it",
            LlmProvider::Huggingface => "HuggingFaceH4/zephyr-7b-beta",
            LlmProvider::Openrouter => "google/gemma-2-9b-it",
        }
    }

    /// Environment variable holding the provider credential.
    pub fn api_key_var(self) -> &'static str {
        match self {
            LlmProvider::Groq => "GROQ_API_KEY",
            LlmProvider::Huggingface => "HF_TOKEN",
            LlmProvider::Openrouter => "OPENROUTER_API_KEY",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub max_tokens: u32,
}

/// LangSmith credentials. Present only when an API key is configured.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub api_key: String,
    pub project: String,
    pub endpoint: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub llm: LlmConfig,
    pub tracing: Option<TracingConfig>,
}

fn default_max_tokens() -> u32 {
    512
}

fn default_tracing_project() -> String {
    "default".to_string()
}

fn default_tracing_endpoint() -> String {
    "https://api.smith.langchain.com".to_string()
}

fn default_web_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8501))
}

/// Load `.env` from the working directory. Values already in the process
/// environment are not overridden.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found"),
        Err(e) => warn!("Failed to read .env file: {}", e),
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Non-blank value for `key`, trimmed.
fn lookup_nonblank<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup_nonblank(lookup, key).with_context(|| format!("Missing {} in environment", key))
}

impl LlmConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match lookup_nonblank(&lookup, "LLM_PROVIDER") {
            Some(p) => p.parse()?,
            None => LlmProvider::default(),
        };

        let api_key = require(&lookup, provider.api_key_var())?;

        let model = lookup_nonblank(&lookup, "LLM_MODEL")
            .unwrap_or_else(|| provider.default_model().to_string());

        let base_url = lookup_nonblank(&lookup, "LLM_BASE_URL")
            .unwrap_or_else(|| provider.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();

        let max_tokens = match lookup_nonblank(&lookup, "LLM_MAX_TOKENS") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("Invalid LLM_MAX_TOKENS '{}'", raw))?,
            None => default_max_tokens(),
        };

        debug!("{} length: {} characters", provider.api_key_var(), api_key.len());

        Ok(Self {
            provider,
            model,
            base_url,
            api_key,
            max_tokens,
        })
    }
}

impl TracingConfig {
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Tracing is optional: a missing key or project is reported once and
    /// never fails startup.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup_nonblank(&lookup, "LANGCHAIN_API_KEY");
        let project = lookup_nonblank(&lookup, "LANGCHAIN_PROJECT");

        if api_key.is_none() {
            warn!("LANGCHAIN_API_KEY not found in environment; run tracing disabled");
        }
        if project.is_none() {
            warn!("LANGCHAIN_PROJECT not found in environment");
        }

        Some(Self {
            api_key: api_key?,
            project: project.unwrap_or_else(default_tracing_project),
            endpoint: lookup_nonblank(&lookup, "LANGCHAIN_ENDPOINT")
                .unwrap_or_else(default_tracing_endpoint)
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = require(&lookup, "TELEGRAM_TOKEN")?;
        let llm = LlmConfig::from_lookup(&lookup)?;
        let tracing = TracingConfig::from_lookup(&lookup);

        info!("Configuration loaded successfully");
        debug!("Telegram token length: {} characters", bot_token.len());

        Ok(Self {
            telegram: TelegramConfig { bot_token },
            llm,
            tracing,
        })
    }
}

/// Listen address for the web UI (`JOKEBOT_WEB_ADDR`).
pub fn web_addr_from_env() -> Result<SocketAddr> {
    web_addr_from_lookup(env_lookup)
}

pub fn web_addr_from_lookup<F>(lookup: F) -> Result<SocketAddr>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup_nonblank(&lookup, "JOKEBOT_WEB_ADDR") {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid JOKEBOT_WEB_ADDR '{}'", raw)),
        None => Ok(default_web_addr()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_config_uses_groq_defaults() {
        let config =
            Config::from_lookup(env(&[("TELEGRAM_TOKEN", "tg"), ("GROQ_API_KEY", "gsk")])).unwrap();
        assert_eq!(config.telegram.bot_token, "tg");
        assert_eq!(config.llm.provider, LlmProvider::Groq);
        assert_eq!(config.llm.model, "gemma2-9b-it");
        assert_eq!(config.llm.base_url, "https://api.groq.com/openai/v1");
        assert_eq!(config.llm.api_key, "gsk");
        assert_eq!(config.llm.max_tokens, 512);
        assert!(config.tracing.is_none());
    }

    #[test]
    fn test_missing_telegram_token_names_variable() {
        let err = Config::from_lookup(env(&[("GROQ_API_KEY", "gsk")])).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_TOKEN"));
    }

    #[test]
    fn test_blank_telegram_token_is_missing() {
        let err = Config::from_lookup(env(&[("TELEGRAM_TOKEN", "  "), ("GROQ_API_KEY", "gsk")]))
            .unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_TOKEN"));
    }

    #[test]
    fn test_missing_provider_key_names_variable() {
        let err = Config::from_lookup(env(&[
            ("TELEGRAM_TOKEN", "tg"),
            ("LLM_PROVIDER", "huggingface"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("HF_TOKEN"));
    }

    #[test]
    fn test_huggingface_provider_defaults() {
        let llm = LlmConfig::from_lookup(env(&[("LLM_PROVIDER", "HF"), ("HF_TOKEN", "hf_x")]))
            .unwrap();
        assert_eq!(llm.provider, LlmProvider::Huggingface);
        assert_eq!(llm.model, "HuggingFaceH4/zephyr-7b-beta");
        assert_eq!(llm.base_url, "https://router.huggingface.co/v1");
    }

    #[test]
    fn test_overrides_are_applied() {
        let llm = LlmConfig::from_lookup(env(&[
            ("LLM_PROVIDER", "openrouter"),
            ("OPENROUTER_API_KEY", "sk-or"),
            ("LLM_MODEL", "meta/llama"),
            ("LLM_BASE_URL", "http://localhost:8080/v1/"),
            ("LLM_MAX_TOKENS", "128"),
        ]))
        .unwrap();
        assert_eq!(llm.model, "meta/llama");
        assert_eq!(llm.base_url, "http://localhost:8080/v1");
        assert_eq!(llm.max_tokens, 128);
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let err = LlmConfig::from_lookup(env(&[("LLM_PROVIDER", "bard")])).unwrap_err();
        assert!(err.to_string().contains("bard"));
    }

    #[test]
    fn test_invalid_max_tokens_is_rejected() {
        let err = LlmConfig::from_lookup(env(&[
            ("GROQ_API_KEY", "gsk"),
            ("LLM_MAX_TOKENS", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("LLM_MAX_TOKENS"));
    }

    #[test]
    fn test_tracing_enabled_with_key_only() {
        let tracing = TracingConfig::from_lookup(env(&[("LANGCHAIN_API_KEY", "ls")])).unwrap();
        assert_eq!(tracing.api_key, "ls");
        assert_eq!(tracing.project, "default");
        assert_eq!(tracing.endpoint, "https://api.smith.langchain.com");
    }

    #[test]
    fn test_tracing_disabled_without_key() {
        assert!(TracingConfig::from_lookup(env(&[("LANGCHAIN_PROJECT", "jokes")])).is_none());
    }

    #[test]
    fn test_web_addr_default_and_override() {
        assert_eq!(
            web_addr_from_lookup(env(&[])).unwrap(),
            SocketAddr::from(([127, 0, 0, 1], 8501))
        );
        assert_eq!(
            web_addr_from_lookup(env(&[("JOKEBOT_WEB_ADDR", "0.0.0.0:9000")]))
                .unwrap()
                .port(),
            9000
        );
        assert!(web_addr_from_lookup(env(&[("JOKEBOT_WEB_ADDR", "nope")])).is_err());
    }
}
