//! Runtime configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use crate::errors::{Error, Result};

pub const API_URL_ENV: &str = "FOODRESCUE_API_URL";
pub const AI_API_KEY_ENV: &str = "FOODRESCUE_AI_API_KEY";
pub const AI_MODEL_ENV: &str = "FOODRESCUE_AI_MODEL";
pub const AI_MAPS_MODEL_ENV: &str = "FOODRESCUE_AI_MAPS_MODEL";
pub const AI_BASE_URL_ENV: &str = "FOODRESCUE_AI_BASE_URL";
pub const DATA_DIR_ENV: &str = "FOODRESCUE_DATA_DIR";
pub const HTTP_TIMEOUT_ENV: &str = "FOODRESCUE_HTTP_TIMEOUT_SECS";

pub const DEFAULT_AI_MODEL: &str = "gemini-3-flash-preview";
/// Model used for maps-grounded place lookups.
pub const DEFAULT_AI_MAPS_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Transport retry policy for the remote data gateway.
///
/// A failed attempt is retried `max_retries` more times with a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_millis(1500),
        }
    }
}

impl RetryPolicy {
    /// No retries and no delay; useful for tests against local servers.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub ai_maps_model: String,
    pub ai_base_url: String,
    pub data_dir: PathBuf,
    pub http_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            ai_api_key: None,
            ai_model: DEFAULT_AI_MODEL.to_string(),
            ai_maps_model: DEFAULT_AI_MAPS_MODEL.to_string(),
            ai_base_url: DEFAULT_AI_BASE_URL.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup (the process
    /// environment in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let read_url = |key: &str| read(key).map(|v| v.trim_end_matches('/').to_string());

        let defaults = Self::default();
        let http_timeout = match read(HTTP_TIMEOUT_ENV).map(|v| v.parse::<u64>()) {
            Some(Ok(secs)) if secs > 0 => Duration::from_secs(secs),
            Some(_) => {
                debug!(
                    "[Config] Ignoring invalid {}, using {}s",
                    HTTP_TIMEOUT_ENV, DEFAULT_HTTP_TIMEOUT_SECS
                );
                defaults.http_timeout
            }
            None => defaults.http_timeout,
        };

        Self {
            api_url: read_url(API_URL_ENV),
            ai_api_key: read(AI_API_KEY_ENV),
            ai_model: read(AI_MODEL_ENV).unwrap_or(defaults.ai_model),
            ai_maps_model: read(AI_MAPS_MODEL_ENV).unwrap_or(defaults.ai_maps_model),
            ai_base_url: read_url(AI_BASE_URL_ENV).unwrap_or(defaults.ai_base_url),
            data_dir: read(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            http_timeout,
            retry: defaults.retry,
        }
    }

    /// Base URL of the remote data gateway.
    pub fn api_url(&self) -> Result<&str> {
        self.api_url.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "{} not configured. Remote data operations are disabled.",
                API_URL_ENV
            ))
        })
    }

    pub fn ai_api_key(&self) -> Result<&str> {
        self.ai_api_key.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "{} not configured. AI analysis is disabled.",
                AI_API_KEY_ENV
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let config = config_from(&[]);
        assert!(config.api_url().is_err());
        assert_eq!(config.ai_model, DEFAULT_AI_MODEL);
        assert_eq!(config.ai_maps_model, DEFAULT_AI_MAPS_MODEL);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.delay, Duration::from_millis(1500));
    }

    #[test]
    fn urls_are_trimmed_and_blank_values_ignored() {
        let config = config_from(&[
            (API_URL_ENV, "  https://script.example.com/exec/  "),
            (AI_API_KEY_ENV, "   "),
            (HTTP_TIMEOUT_ENV, "abc"),
        ]);
        assert_eq!(config.api_url().unwrap(), "https://script.example.com/exec");
        assert!(config.ai_api_key.is_none());
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn retry_policy_counts_attempts() {
        assert_eq!(RetryPolicy::default().total_attempts(), 3);
        assert_eq!(RetryPolicy::none().total_attempts(), 1);
    }
}
