use anyhow::Context;
use pagekit_editor::ModelConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "pagekit.config.json";

/// Pagekit configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Model path of the page root; falls back to the model's own `:path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_path: Option<String>,

    /// Render with edit affordances
    #[serde(default)]
    pub editor_mode: bool,

    /// Bypass the service cache when fetching
    #[serde(default)]
    pub force_reload: bool,

    /// Fetch node models on mount when they are not cached
    #[serde(default = "default_true")]
    pub inject_props_on_init: bool,

    /// Maximum container nesting
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> usize {
    pagekit_evaluator::DEFAULT_MAX_DEPTH
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = Self::path(cwd);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Invalid config in {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn path(cwd: &Path) -> PathBuf {
        cwd.join(DEFAULT_CONFIG_NAME)
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            force_reload: self.force_reload,
            inject_props_on_init: self.inject_props_on_init,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_path: None,
            editor_mode: false,
            force_reload: false,
            inject_props_on_init: default_true(),
            max_depth: default_max_depth(),
        }
    }
}
