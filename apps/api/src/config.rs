use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub upstream_api_url: String,
    pub upstream_api_token: Option<String>,
    pub upstream_timeout: Duration,
    pub selection_store_path: PathBuf,
    pub delete_cooldown: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            upstream_api_url: require_env("UPSTREAM_API_URL")?
                .trim_end_matches('/')
                .to_string(),
            upstream_api_token: std::env::var("UPSTREAM_API_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            upstream_timeout: Duration::from_secs(parse_env("UPSTREAM_TIMEOUT_SECS", 30)?),
            selection_store_path: std::env::var("SELECTION_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".promptdesk/selection.json")),
            delete_cooldown: Duration::from_millis(parse_env("DELETE_COOLDOWN_MS", 1000)?),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Configuration pointing at a given upstream, with defaults everywhere else.
    /// Used by router tests.
    #[cfg(test)]
    pub fn for_upstream(url: &str) -> Self {
        Config {
            upstream_api_url: url.trim_end_matches('/').to_string(),
            upstream_api_token: Some("test-token".to_string()),
            upstream_timeout: Duration::from_secs(5),
            selection_store_path: PathBuf::from("selection.json"),
            delete_cooldown: Duration::from_millis(1000),
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
