use std::env;
use std::path::Path;
use std::time::Duration;

use quiz_core::countdown::QUESTION_SECONDS;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Seconds an issue status message stays visible.
pub const STATUS_CLEAR_SECS: u64 = 2;

/// Backoff used when retries are enabled from the environment alone.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// How completed quiz records are handed to the persistence collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Single attempt; failures are logged and dropped.
    #[default]
    FireAndForget,
    /// Up to `attempts` tries with a fixed pause between them.
    Retry { attempts: u32, backoff_ms: u64 },
}

/// Remote collaborator settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
}

/// Runtime knobs for the quiz engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub question_seconds: u32,
    pub status_clear_secs: u64,
    pub record_delivery: DeliveryMode,
    pub api: ApiConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            question_seconds: QUESTION_SECONDS,
            status_clear_secs: STATUS_CLEAR_SECS,
            record_delivery: DeliveryMode::FireAndForget,
            api: ApiConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `QUIZ_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable cannot be parsed or the result is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Toml` on malformed input, or a validation error.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an optional TOML file, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or parsed, or the result is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config: Self = match path {
            Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `QUIZ_*` overrides read through `lookup`.
    ///
    /// `QUIZ_RECORD_RETRIES=0` selects fire-and-forget; any positive count
    /// enables bounded retry, keeping a configured backoff if there is one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnv` if a numeric variable does not parse.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup("QUIZ_QUESTION_SECONDS") {
            self.question_seconds = parse_env("QUIZ_QUESTION_SECONDS", &value)?;
        }
        if let Some(value) = lookup("QUIZ_STATUS_CLEAR_SECS") {
            self.status_clear_secs = parse_env("QUIZ_STATUS_CLEAR_SECS", &value)?;
        }
        if let Some(value) = lookup("QUIZ_RECORD_RETRIES") {
            let attempts: u32 = parse_env("QUIZ_RECORD_RETRIES", &value)?;
            self.record_delivery = if attempts == 0 {
                DeliveryMode::FireAndForget
            } else {
                let backoff_ms = match self.record_delivery {
                    DeliveryMode::Retry { backoff_ms, .. } => backoff_ms,
                    DeliveryMode::FireAndForget => DEFAULT_RETRY_BACKOFF_MS,
                };
                DeliveryMode::Retry {
                    attempts,
                    backoff_ms,
                }
            };
        }
        if let Some(value) = lookup("QUIZ_API_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.api.base_url = Some(value);
        }
        if let Some(value) = lookup("QUIZ_API_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.api.token = Some(value);
        }
        Ok(())
    }

    /// Check value ranges and the base URL.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.question_seconds == 0 {
            return Err(ConfigError::NonPositive("question_seconds"));
        }
        if self.status_clear_secs == 0 {
            return Err(ConfigError::NonPositive("status_clear_secs"));
        }
        if let DeliveryMode::Retry { attempts: 0, .. } = self.record_delivery {
            return Err(ConfigError::NonPositive("record_delivery.attempts"));
        }
        if let Some(base_url) = &self.api.base_url {
            Url::parse(base_url)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn status_clear_delay(&self) -> Duration {
        Duration::from_secs(self.status_clear_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key,
        value: value.to_owned(),
    })
}
