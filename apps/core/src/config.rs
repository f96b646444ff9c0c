//! Application configuration, read from the environment (and `.env`).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::error::AppError;
use crate::security::rate_limiter::RateLimitPolicy;

// --- Defaults ---
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 10;
const DEFAULT_RATE_LIMIT_WINDOW_MS: u64 = 60_000;
const DEFAULT_MAX_INPUT_CHARS: u64 = 2000;
const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/";
const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    /// Bunyan-style JSON lines
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" | "bunyan" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!("Unknown LOG_FORMAT: {}", other))),
        }
    }
}

/// Connection settings for the security edge functions
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityServiceConfig {
    /// Base URL under which `rate-limiter` and `security-monitor` live
    pub base_url: Url,
    /// Optional API key, sent as bearer token and `apikey` header
    pub api_key: Option<String>,
}

/// Settings for the chat-completions backend
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub api_url: Url,
    pub api_key: Option<String>,
    pub model: String,
    /// Upper bound for one completion, separate from `http_timeout`
    pub timeout: Duration,
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub security: Option<SecurityServiceConfig>,
    pub rate_limit: RateLimitPolicy,
    pub max_input_chars: u64,
    pub llm: LlmConfig,
    pub http_timeout: Duration,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            security: None,
            rate_limit: RateLimitPolicy::new(
                DEFAULT_RATE_LIMIT_MAX_REQUESTS,
                Duration::from_millis(DEFAULT_RATE_LIMIT_WINDOW_MS),
            ),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            llm: LlmConfig {
                // Constant URL, always valid
                api_url: Url::parse(DEFAULT_LLM_API_URL).expect("Invalid default LLM URL"),
                api_key: None,
                model: DEFAULT_LLM_MODEL.to_string(),
                timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
            },
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the configuration from the environment.
    pub fn load() -> Result<Self, AppError> {
        if let Err(e) = dotenv::dotenv() {
            // A missing .env file is the normal case in production
            if !e.not_found() {
                warn!("Failed to read .env file: {}", e);
            }
        }
        Self::from_env()
    }

    /// Reads the configuration from the process environment only.
    pub fn from_env() -> Result<Self, AppError> {
        let security = match non_empty_var("SECURITY_SERVICE_URL") {
            Some(raw) => Some(SecurityServiceConfig {
                base_url: parse_base_url(&raw)?,
                api_key: non_empty_var("SECURITY_SERVICE_KEY"),
            }),
            None => None,
        };

        let max_requests = parse_var("RATE_LIMIT_MAX_REQUESTS", DEFAULT_RATE_LIMIT_MAX_REQUESTS)?;
        let window_ms = parse_var("RATE_LIMIT_WINDOW_MS", DEFAULT_RATE_LIMIT_WINDOW_MS)?;
        if max_requests == 0 || window_ms == 0 {
            return Err(AppError::Config(
                "RATE_LIMIT_MAX_REQUESTS and RATE_LIMIT_WINDOW_MS must be positive".to_string(),
            ));
        }

        let max_input_chars = parse_var("MAX_INPUT_CHARS", DEFAULT_MAX_INPUT_CHARS)?;
        if max_input_chars == 0 {
            return Err(AppError::Config("MAX_INPUT_CHARS must be positive".to_string()));
        }

        let llm_timeout_secs = parse_var("LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)?;
        if llm_timeout_secs == 0 {
            return Err(AppError::Config("LLM_TIMEOUT_SECS must be positive".to_string()));
        }

        let api_url = non_empty_var("LLM_API_URL").unwrap_or_else(|| DEFAULT_LLM_API_URL.to_string());

        Ok(Self {
            security,
            rate_limit: RateLimitPolicy::new(max_requests, Duration::from_millis(window_ms)),
            max_input_chars,
            llm: LlmConfig {
                api_url: parse_base_url(&api_url)?,
                api_key: non_empty_var("LLM_API_KEY"),
                model: non_empty_var("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
                timeout: Duration::from_secs(llm_timeout_secs),
            },
            http_timeout: Duration::from_secs(parse_var(
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            log_format: match non_empty_var("LOG_FORMAT") {
                Some(raw) => raw.parse()?,
                None => LogFormat::default(),
            },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match non_empty_var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid value for {}: {}", key, raw))),
        None => Ok(default),
    }
}

/// Parses a base URL and makes sure relative joins keep its last path segment.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
