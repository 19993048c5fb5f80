//! Bot configuration stored in `bot.toml`.

use std::fs;
use std::path::Path;

use agent::io::config::{ModelConfig, SearchConfig};
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::prompts::{PromptItem, default_prompts};
use crate::trip::TripConfig;

pub const DEFAULT_CONFIG_PATH: &str = "bot.toml";

/// Bot configuration (TOML).
///
/// Missing fields default to sensible values. Secrets may be left out and
/// supplied through the environment instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BotConfig {
    /// Language every generated message is translated to.
    pub language: String,
    /// Account name used in step links. Overrides the one in the trip
    /// export when non-empty.
    pub username: String,
    pub trips: Vec<TripConfig>,
    /// Replaces the built-in prompt catalog when non-empty.
    pub prompts: Vec<PromptItem>,
    pub model: ModelConfig,
    pub search: SearchConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            language: "English".to_string(),
            username: String::new(),
            trips: Vec::new(),
            prompts: Vec::new(),
            model: ModelConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl BotConfig {
    pub fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            return Err(anyhow!("language must be non-empty"));
        }
        for (index, trip) in self.trips.iter().enumerate() {
            if trip.trip_id.trim().is_empty() {
                return Err(anyhow!("trips[{index}].trip_id must be non-empty"));
            }
            if trip.archive.as_os_str().is_empty() {
                return Err(anyhow!("trips[{index}].archive must be set"));
            }
        }
        if let Some(index) = self
            .prompts
            .iter()
            .position(|item| item.prompt.trim().is_empty())
        {
            return Err(anyhow!("prompts[{index}].prompt must be non-empty"));
        }
        self.model.validate().context("invalid [model]")?;
        self.search.validate().context("invalid [search]")?;
        Ok(())
    }

    /// Configured prompts, or the built-in catalog.
    pub fn prompts(&self) -> Vec<PromptItem> {
        if self.prompts.is_empty() {
            default_prompts()
        } else {
            self.prompts.clone()
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BotConfig::default()`. Relative archive
/// paths are resolved against the config file's directory.
pub fn load_config(path: &Path) -> Result<BotConfig> {
    if !path.exists() {
        let cfg = BotConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut cfg: BotConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    if let Some(base) = path.parent() {
        for trip in &mut cfg.trips {
            if trip.archive.is_relative() {
                trip.archive = base.join(&trip.archive);
            }
        }
    }
    Ok(cfg)
}
