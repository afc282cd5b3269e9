//! Environment-driven settings for the stylist client.
//! Read once at start-up, after `dotenvy` has loaded any `.env` file.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    ClientConfig, DEFAULT_BASE_URL, DEFAULT_IMAGE_MAX_RETRIES, DEFAULT_IMAGE_MODEL,
    DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TEXT_MODEL,
};

/// Settings errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("GEMINI_API_KEY (or API_KEY) is not set")]
    MissingApiKey,
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// Provider API key
    pub api_key: String,
    /// Provider API base URL
    pub base_url: String,
    /// Model for text and structured output
    pub text_model: String,
    /// Model for image output
    pub image_model: String,
    /// Attempt budget for text and structured requests
    pub max_retries: u32,
    /// Attempt budget for image requests
    pub image_max_retries: u32,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            image_max_retries: DEFAULT_IMAGE_MAX_RETRIES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl AiSettings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = var("GEMINI_API_KEY")
            .or_else(|| var("API_KEY"))
            .ok_or(SettingsError::MissingApiKey)?;

        Ok(Self {
            api_key,
            base_url: var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            text_model: var("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: var("GEMINI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            max_retries: parse_positive::<u32>("AI_MAX_RETRIES", var("AI_MAX_RETRIES"))?
                .unwrap_or(defaults.max_retries),
            image_max_retries: parse_positive::<u32>(
                "AI_IMAGE_MAX_RETRIES",
                var("AI_IMAGE_MAX_RETRIES"),
            )?
                .unwrap_or(defaults.image_max_retries),
            request_timeout_secs: parse_positive::<u64>(
                "AI_REQUEST_TIMEOUT_SECS",
                var("AI_REQUEST_TIMEOUT_SECS"),
            )?
            .unwrap_or(defaults.request_timeout_secs),
        })
    }

    /// Build the client configuration.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_base_url(&self.base_url)
            .with_api_key(&self.api_key)
            .with_text_model(&self.text_model)
            .with_image_model(&self.image_model)
            .with_max_retries(self.max_retries)
            .with_image_max_retries(self.image_max_retries)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
    }
}

fn parse_value<T: FromStr>(
    name: &'static str,
    value: Option<String>,
) -> Result<Option<T>, SettingsError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let parsed = value.trim().parse::<T>();
    match parsed {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) => Err(SettingsError::InvalidValue { name, value }),
    }
}

/// Attempt budgets and timeouts must be non-zero.
fn parse_positive<T: FromStr + Default + PartialEq>(
    name: &'static str,
    value: Option<String>,
) -> Result<Option<T>, SettingsError> {
    match parse_value::<T>(name, value.clone())? {
        Some(parsed) if parsed == T::default() => Err(SettingsError::InvalidValue {
            name,
            value: value.unwrap_or_default(),
        }),
        parsed => Ok(parsed),
    }
}
