// src/common/config.rs
//! Console configuration loaded from the environment.
//! The backend base URL is always injected, never read ambiently by the gateway.

use reqwest::Url;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_POLL_ATTEMPTS: u32 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("API_BASE_URL is not a valid URL: {0}")]
    InvalidBaseUrl(String),

    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },

    #[error("CANDIDATES_PAGE_SIZE must be between 1 and {max}, got {value}")]
    PageSizeOutOfRange { value: u32, max: u32 },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// How the console polls a freshly uploaded candidate for extraction results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: DEFAULT_POLL_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub api_base_url: Url,
    pub request_timeout: Duration,
    pub page_size: u32,
    pub poll: PollConfig,
}

impl ConsoleConfig {
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url(api_base_url)?,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            poll: PollConfig::default(),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let base_url =
            env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let timeout_secs = read_number("API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let page_size = read_number("CANDIDATES_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let poll_interval_ms =
            read_number("EXTRACTION_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?;
        let poll_attempts = read_number("EXTRACTION_POLL_ATTEMPTS", DEFAULT_POLL_ATTEMPTS)?;

        if page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::PageSizeOutOfRange {
                value: page_size,
                max: MAX_PAGE_SIZE,
            });
        }

        Ok(Self {
            api_base_url: parse_base_url(&base_url)?,
            request_timeout: Duration::from_secs(timeout_secs),
            page_size,
            poll: PollConfig {
                interval: Duration::from_millis(poll_interval_ms),
                max_attempts: poll_attempts,
            },
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Parses the base URL and guarantees a trailing slash so relative
/// endpoint paths join beneath it instead of replacing its last segment.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let url = Url::parse(&normalized).map_err(|_| ConfigError::InvalidBaseUrl(raw.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(url)
}

fn read_number<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + From<u8>,
{
    match env::var(name) {
        Ok(value) => parse_positive(name, &value),
        Err(_) => Ok(default),
    }
}

/// Parses a strictly positive number. Values that do not fit `T` are
/// rejected rather than wrapped.
fn parse_positive<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + From<u8>,
{
    match raw.trim().parse::<T>() {
        Ok(parsed) if parsed > T::from(0) => Ok(parsed),
        _ => Err(ConfigError::InvalidNumber {
            name,
            value: raw.to_string(),
        }),
    }
}
