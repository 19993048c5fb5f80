//! Endpoint configuration for the model and search collaborators.
//!
//! Both sections are embedded in the bot's TOML file. Missing fields default
//! to sensible values; secrets may instead come from the environment.

use std::env;
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const SEARCH_API_KEY_ENV: &str = "GOOGLE_SEARCH_API_KEY";
pub const SEARCH_ENGINE_ID_ENV: &str = "GOOGLE_SEARCH_ENGINE_ID";

/// Language-model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
    pub model_id: String,
    pub base_url: String,
    /// Falls back to `GEMINI_API_KEY` when unset.
    pub api_key: Option<String>,
    /// Per-request timeout; a timeout counts as a failed generation.
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            request_timeout_secs: 60,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model_id.trim().is_empty() {
            return Err(anyhow!("model.model_id must be non-empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("model.request_timeout_secs must be > 0"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn resolve_api_key(&self) -> Result<String> {
        resolve_secret(self.api_key.as_deref(), GEMINI_API_KEY_ENV, "model.api_key")
    }
}

/// Web search and page fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    pub base_url: String,
    /// Falls back to `GOOGLE_SEARCH_API_KEY` when unset.
    pub api_key: Option<String>,
    /// Custom search engine id; falls back to `GOOGLE_SEARCH_ENGINE_ID`.
    pub engine_id: Option<String>,
    pub results_per_query: u32,
    /// Timeout for search queries and page fetches.
    pub request_timeout_secs: u64,
    /// Stop reading a page body after this many bytes.
    pub max_page_bytes: usize,
    /// Truncate fetched page text beyond this many characters.
    pub page_char_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/customsearch/v1".to_string(),
            api_key: None,
            engine_id: None,
            results_per_query: 5,
            request_timeout_secs: 30,
            max_page_bytes: 300_000,
            page_char_limit: 20_000,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=10).contains(&self.results_per_query) {
            return Err(anyhow!("search.results_per_query must be within 1..=10"));
        }
        if self.request_timeout_secs == 0 {
            return Err(anyhow!("search.request_timeout_secs must be > 0"));
        }
        if self.max_page_bytes == 0 {
            return Err(anyhow!("search.max_page_bytes must be > 0"));
        }
        if self.page_char_limit == 0 {
            return Err(anyhow!("search.page_char_limit must be > 0"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn resolve_api_key(&self) -> Result<String> {
        resolve_secret(self.api_key.as_deref(), SEARCH_API_KEY_ENV, "search.api_key")
    }

    pub fn resolve_engine_id(&self) -> Result<String> {
        resolve_secret(
            self.engine_id.as_deref(),
            SEARCH_ENGINE_ID_ENV,
            "search.engine_id",
        )
    }
}

fn resolve_secret(configured: Option<&str>, env_var: &str, field: &str) -> Result<String> {
    configured
        .map(str::to_string)
        .or_else(|| env::var(env_var).ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow!("missing {field} (set it in the config or export {env_var})"))
}
