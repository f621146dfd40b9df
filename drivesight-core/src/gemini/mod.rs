//! Gemini-backed perception and summary adapters.
//!
//! Both adapters share one [`GeminiClient`], which wraps the
//! `models/{model}:generateContent` endpoint with HTTPS-only transport and
//! exponential-backoff retries on transient failures.
//!
//! ## Environment
//!
//! - `GEMINI_API_KEY` (required)
//! - `GEMINI_MODEL` (default `gemini-2.0-flash-exp`)
//! - `GEMINI_API_URL` (default `https://generativelanguage.googleapis.com/v1beta`)
//! - `GEMINI_TIMEOUT_SECS` (default 30)
//! - `GEMINI_MAX_RETRIES` (default 3)

mod client;
mod perception;
mod summary;

pub use client::{GeminiClient, GenerationConfig};
pub use perception::GeminiPerception;
pub use summary::GeminiSummarizer;

use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// Base URL without trailing slash
    pub api_url: String,
    /// Upper bound for one request when the caller gives none
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors
    pub max_retries: u32,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: MAX_RETRIES,
        }
    }

    /// Load from `GEMINI_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("GEMINI_API_KEY environment variable not set".into()))?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.model = model;
        }
        if let Ok(url) = std::env::var("GEMINI_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = std::env::var("GEMINI_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            config.max_retries = retries;
        }

        Ok(config)
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }
}
