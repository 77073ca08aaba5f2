//! Configuration file
//!
//! One TOML file describes the models that can be exported, the stored
//! download selections, registered actions and mail settings. Relative
//! record paths are resolved against the directory holding the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::actions::{Action, ActionRegistry};
use crate::export::DEFAULT_SHEET_NAME;
use crate::mail::{MailError, MailSettings};
use crate::selection::{self, DownloadSelection};

/// Environment variable pointing at the configuration file
pub const CONFIG_ENV: &str = "NMADB_CONFIG";

const APP_DIR: &str = "nmadb-utils";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub export: ExportSettings,
    pub mail: MailSettings,
    pub models: Vec<ModelConfig>,
    pub selections: Vec<DownloadSelection>,
    pub actions: Vec<Action>,
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Sheet name used for exported data
    pub sheet_name: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        ExportSettings {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

/// An exportable model backed by a JSON file of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    /// JSON array of records, relative to the config file
    pub records: PathBuf,
    /// Changelist columns; the first one is the row link and never exported
    #[serde(default)]
    pub list_display: Vec<String>,
    /// Mapping used by the plain download actions, overriding `list_display`
    #[serde(default)]
    pub sheet_mapping: Option<String>,
}

impl Config {
    /// Default location: `<config dir>/nmadb-utils/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Explicit path first, then `NMADB_CONFIG`, then the default location
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        Self::default_path()
    }

    /// Load and validate the configuration; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if !path.exists() {
            log::warn!(
                "Config file {} not found, using defaults",
                path.display()
            );
            let mut config = Config::default();
            config.base_dir = base_dir;
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config.base_dir = base_dir;

        log::debug!(
            "Loaded config from {} ({} models, {} selections, {} actions)",
            path.display(),
            config.models.len(),
            config.selections.len(),
            config.actions.len()
        );
        Ok(config)
    }

    /// Parse and validate TOML text; relative paths resolve against the cwd
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.mail.batch_size == 0 {
            return Err(MailError::InvalidBatchSize.into());
        }

        let mut names = std::collections::HashSet::new();
        for model in &self.models {
            if model.name.trim().is_empty() {
                anyhow::bail!("Model name cannot be empty");
            }
            if !names.insert(model.name.as_str()) {
                anyhow::bail!("Model '{}' is defined more than once", model.name);
            }
        }

        selection::validate_selections(&self.selections)?;
        self.action_registry()?;
        Ok(())
    }

    pub fn model(&self, name: &str) -> Result<&ModelConfig> {
        self.models.iter().find(|m| m.name == name).with_context(|| {
            let known: Vec<_> = self.models.iter().map(|m| m.name.as_str()).collect();
            format!(
                "Unknown model '{}' (configured: {})",
                name,
                if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                }
            )
        })
    }

    pub fn selection(&self, title: &str) -> Option<&DownloadSelection> {
        self.selections.iter().find(|s| s.title == title)
    }

    /// Registry of the configured actions, in configuration order
    pub fn action_registry(&self) -> Result<ActionRegistry> {
        let mut builder = ActionRegistry::builder();
        for action in &self.actions {
            builder.register(action.clone())?;
        }
        Ok(builder.build())
    }

    /// Path of the records file for `model`
    pub fn records_path(&self, model: &ModelConfig) -> PathBuf {
        if model.records.is_absolute() {
            model.records.clone()
        } else {
            self.base_dir.join(&model.records)
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
