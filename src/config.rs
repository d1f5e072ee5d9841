use std::time::Duration;

use serde::Deserialize;

use crate::services::retry::RetryPolicy;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// OpenAI-compatible API key for the completion backend
    pub openai_api_key: String,

    /// Completion API base URL (without the `/chat/completions` suffix)
    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    #[serde(default = "default_openai_temperature")]
    pub openai_temperature: f32,

    #[serde(default = "default_openai_max_tokens")]
    pub openai_max_tokens: u32,

    /// Mapbox access token used for forward geocoding
    pub mapbox_access_token: String,

    /// Mapbox API base URL
    #[serde(default = "default_mapbox_api_url")]
    pub mapbox_api_url: String,

    /// Attempts per geocoding query, including the first one
    #[serde(default = "default_max_attempts")]
    pub geocode_max_attempts: u32,

    /// Initial backoff delay for geocoding retries, doubled on each retry
    #[serde(default = "default_base_delay_ms")]
    pub geocode_base_delay_ms: u64,

    /// Minimum spacing between any two outbound geocoding requests
    #[serde(default = "default_min_interval_ms")]
    pub geocode_min_interval_ms: u64,

    /// Attempts for the completion call when the backend answers 429
    #[serde(default = "default_max_attempts")]
    pub completion_max_attempts: u32,

    /// Per-request timeout for outbound HTTP calls
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_openai_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_temperature() -> f32 {
    0.7
}

fn default_openai_max_tokens() -> u32 {
    1000
}

fn default_mapbox_api_url() -> String {
    "https://api.mapbox.com".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_min_interval_ms() -> u64 {
    1000
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn geocode_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.geocode_max_attempts,
            Duration::from_millis(self.geocode_base_delay_ms),
        )
    }

    /// Completion retries reuse the geocoding backoff base.
    pub fn completion_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.completion_max_attempts,
            Duration::from_millis(self.geocode_base_delay_ms),
        )
    }

    pub fn geocode_min_interval(&self) -> Duration {
        Duration::from_millis(self.geocode_min_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
