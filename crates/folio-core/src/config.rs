//! Environment-sourced configuration.
//!
//! Every setting has a default in [`crate::defaults`] except the model
//! credential. Binaries load a `.env` file with `dotenvy` before calling
//! [`FolioConfig::from_env`].
//!
//! ```rust,no_run
//! use folio_core::FolioConfig;
//!
//! let config = FolioConfig::from_env().expect("invalid configuration");
//! println!("store: {}", config.database_url);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::defaults;
use crate::{Error, Result};

/// Settings for the Anthropic model client.
///
/// The credential is never serialized and is redacted from `Debug` output.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct InferenceSettings {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl InferenceSettings {
    /// Settings with defaults and the given credential.
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: defaults::ANTHROPIC_MODEL.to_string(),
            base_url: defaults::ANTHROPIC_URL.to_string(),
            max_retries: defaults::INFERENCE_MAX_RETRIES,
            timeout_secs: defaults::INFERENCE_TIMEOUT_SECS,
            max_tokens: defaults::INFERENCE_MAX_TOKENS,
        }
    }
}

impl fmt::Debug for InferenceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceSettings")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Top-level configuration for an onboarding process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FolioConfig {
    pub database_url: String,
    pub max_concurrency: usize,
    pub inference: InferenceSettings,
}

impl FolioConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get(defaults::ENV_ANTHROPIC_API_KEY).ok_or_else(|| {
            Error::Config(format!("{} is not set", defaults::ENV_ANTHROPIC_API_KEY))
        })?;

        let inference = InferenceSettings {
            api_key,
            model: get(defaults::ENV_ANTHROPIC_MODEL)
                .unwrap_or_else(|| defaults::ANTHROPIC_MODEL.to_string()),
            base_url: get(defaults::ENV_ANTHROPIC_BASE_URL)
                .unwrap_or_else(|| defaults::ANTHROPIC_URL.to_string()),
            max_retries: parse_or(
                get(defaults::ENV_ANTHROPIC_MAX_RETRIES),
                defaults::ENV_ANTHROPIC_MAX_RETRIES,
                defaults::INFERENCE_MAX_RETRIES,
            )?,
            timeout_secs: parse_or(
                get(defaults::ENV_ANTHROPIC_TIMEOUT),
                defaults::ENV_ANTHROPIC_TIMEOUT,
                defaults::INFERENCE_TIMEOUT_SECS,
            )?,
            max_tokens: parse_or(
                get(defaults::ENV_ANTHROPIC_MAX_TOKENS),
                defaults::ENV_ANTHROPIC_MAX_TOKENS,
                defaults::INFERENCE_MAX_TOKENS,
            )?,
        };

        let max_concurrency = parse_or(
            get(defaults::ENV_MAX_CONCURRENCY),
            defaults::ENV_MAX_CONCURRENCY,
            defaults::MAX_CONCURRENCY,
        )?;
        if max_concurrency == 0 {
            return Err(Error::Config(format!(
                "{} must be at least 1",
                defaults::ENV_MAX_CONCURRENCY
            )));
        }

        let config = Self {
            database_url: get(defaults::ENV_DATABASE_URL)
                .unwrap_or_else(|| defaults::DATABASE_URL.to_string()),
            max_concurrency,
            inference,
        };

        debug!(
            subsystem = "config",
            model = %config.inference.model,
            max_concurrency = config.max_concurrency,
            "Loaded configuration"
        );
        Ok(config)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: {:?}", key, raw))),
    }
}
