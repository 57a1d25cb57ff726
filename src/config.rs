//! Configuration management for the agent.
//!
//! Configuration can be set via environment variables:
//! - `DEEPSEEK_API_KEY` - Required. API key for the chat-completions endpoint.
//!   `LLM_API_KEY` takes precedence when both are set.
//! - `LLM_BASE_URL` - Optional. OpenAI-compatible base URL. Defaults to `https://api.deepseek.com`.
//! - `LLM_MODEL` - Optional. Model identifier. Defaults to `deepseek-chat`.
//! - `MAX_ITERATIONS` - Optional. Maximum think-act-observe cycles. Defaults to `5`.
//! - `HTTP_TIMEOUT_SECS` - Optional. Timeout for a single model call. Defaults to `60`.
//! - `TAVILY_API_KEY` - Optional. Enables the attraction search tool.
//! - `TAVILY_BASE_URL` - Optional. Defaults to `https://api.tavily.com`.
//! - `WEATHER_BASE_URL` - Optional. Defaults to `https://wttr.in`.

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_MAX_ITERATIONS: usize = 5;
pub const DEFAULT_TAVILY_BASE_URL: &str = "https://api.tavily.com";
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://wttr.in";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Tool collaborator settings.
#[derive(Debug, Clone)]
pub struct ToolsConfig {
    /// Tavily API key (attraction search is disabled without it)
    pub tavily_api_key: Option<String>,

    /// Tavily API base URL
    pub tavily_base_url: String,

    /// wttr.in compatible weather endpoint
    pub weather_base_url: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            tavily_api_key: None,
            tavily_base_url: DEFAULT_TAVILY_BASE_URL.to_string(),
            weather_base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
        }
    }
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the chat-completions endpoint
    pub api_key: String,

    /// OpenAI-compatible base URL (without `/chat/completions`)
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Maximum cycles for the agent loop
    pub max_iterations: usize,

    /// Timeout for one model request, in seconds
    pub http_timeout_secs: u64,

    /// Tool configuration
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no API key is set, and
    /// `ConfigError::InvalidValue` for unparsable numbers.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |k: String| (!k.trim().is_empty()).then_some(k);
        let api_key = lookup("LLM_API_KEY")
            .and_then(non_blank)
            .or_else(|| lookup("DEEPSEEK_API_KEY").and_then(non_blank))
            .ok_or_else(|| ConfigError::MissingEnvVar("DEEPSEEK_API_KEY".to_string()))?;

        let base_url = lookup("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let model = lookup("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_iterations = lookup("MAX_ITERATIONS")
            .map(|v| {
                v.trim()
                    .parse::<usize>()
                    .map_err(|e| ConfigError::InvalidValue("MAX_ITERATIONS".to_string(), format!("{}", e)))
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_ITERATIONS);

        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let http_timeout_secs = lookup("HTTP_TIMEOUT_SECS")
            .map(|v| {
                v.trim()
                    .parse::<u64>()
                    .map_err(|e| ConfigError::InvalidValue("HTTP_TIMEOUT_SECS".to_string(), format!("{}", e)))
            })
            .transpose()?
            .unwrap_or(60);

        let tools = ToolsConfig {
            tavily_api_key: lookup("TAVILY_API_KEY").filter(|k| !k.trim().is_empty()),
            tavily_base_url: lookup("TAVILY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_TAVILY_BASE_URL.to_string()),
            weather_base_url: lookup("WEATHER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_WEATHER_BASE_URL.to_string()),
        };

        Ok(Self {
            api_key,
            base_url,
            model,
            max_iterations,
            http_timeout_secs,
            tools,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            api_key,
            base_url,
            model,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            http_timeout_secs: 60,
            tools: ToolsConfig::default(),
        }
    }
}
