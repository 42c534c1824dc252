//! Data-source configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::data_source::{build_data_source_factory, HttpDataSourceFactory};
use super::user_agent::{resolve_user_agent, AgentDefaults, SystemAgentDefaults};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Persisted settings for HTTP data sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceSettings {
    /// Default user agent; falls back to the process environment when unset
    pub default_user_agent: Option<String>,
    /// Headers sent with every request
    pub headers: HashMap<String, String>,
    pub log_level: String, // "error", "warn", "info", "debug", "trace"
}

impl Default for DataSourceSettings {
    fn default() -> Self {
        Self {
            default_user_agent: None,
            headers: HashMap::new(),
            log_level: "info".to_string(),
        }
    }
}

impl AgentDefaults for DataSourceSettings {
    fn default_user_agent(&self) -> Option<String> {
        self.default_user_agent
            .clone()
            .or_else(|| SystemAgentDefaults::new().default_user_agent())
    }
}

impl DataSourceSettings {
    /// Load settings from the default location, creating them if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    /// Load settings from `path`, writing defaults there if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;

            let settings: DataSourceSettings =
                serde_json::from_str(&content).with_context(|| "Failed to parse config file")?;
            settings
                .validate()
                .with_context(|| format!("Invalid configuration in {:?}", path))?;

            tracing::info!("Loaded data source settings from: {:?}", path);
            Ok(settings)
        } else {
            let settings = Self::default();
            settings.save_to(path)?;
            tracing::info!("Created default data source settings at: {:?}", path);
            Ok(settings)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        tracing::info!("Saved data source settings to: {:?}", path);
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn get_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "player", "data-source")
            .with_context(|| "Failed to get project directories")?;

        Ok(project_dirs.config_dir().join("data_source.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log level {:?}: must be 'error', 'warn', 'info', 'debug', or 'trace'",
                self.log_level
            );
        }

        for name in self.headers.keys() {
            if name.is_empty() {
                anyhow::bail!("Header names must not be empty");
            }
            if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
                anyhow::bail!("Invalid header name {:?}", name);
            }
        }

        Ok(())
    }

    /// Resolve the user agent from these settings and build a factory
    pub fn factory(&self) -> HttpDataSourceFactory {
        let user_agent = resolve_user_agent(self, Some(&self.headers));
        build_data_source_factory(user_agent, Some(&self.headers))
    }
}
