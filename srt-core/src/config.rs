use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::graph::GraphMode;
use crate::models::TemplateLibrary;
use crate::source::TemplateSource;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "SRT_CONFIG_PATH";
/// Environment variable overriding the template data file
pub const DATA_PATH_ENV: &str = "SRT_DATA";

const DEFAULT_DATA_PATH: &str = "srts.yaml";
const CONFIG_FILE_NAME: &str = ".srt-assist.config";

fn default_data_path() -> String {
    DEFAULT_DATA_PATH.to_string()
}

/// User settings for the `srt` tool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Path to the template file
    #[serde(default = "default_data_path")]
    pub data_path: String,
    /// Template used when none is given on the command line
    #[serde(default)]
    pub default_template: Option<String>,
    #[serde(default)]
    pub default_view: GraphMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            default_template: None,
            default_view: GraphMode::default(),
        }
    }
}

impl Config {
    /// Loads the config from the provided path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Loads the config, falling back to defaults when the file is absent
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            debug!("No config at {:?}; using defaults", path.as_ref());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Save the config to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(&self)?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Creates a default config file if it doesn't exist.
    /// Returns true when a file was written.
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<bool> {
        if path.as_ref().exists() {
            return Ok(false);
        }
        Self::default().save(path)?;
        Ok(true)
    }

    /// Data file: explicit path, then `SRT_DATA`, then `data_path`
    pub fn resolve_data_path(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(DATA_PATH_ENV) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        PathBuf::from(&self.data_path)
    }

    /// Template id: explicit id, then `default_template`, then the only
    /// template in the library
    pub fn resolve_template_id(
        &self,
        explicit: Option<&str>,
        library: &TemplateLibrary,
    ) -> Result<String> {
        if let Some(id) = explicit {
            return Ok(id.to_string());
        }
        if let Some(id) = &self.default_template {
            return Ok(id.clone());
        }
        let mut ids = library.template_ids()?;
        match ids.len() {
            1 => Ok(ids.remove(0)),
            0 => anyhow::bail!("No templates in the data file"),
            _ => anyhow::bail!(
                "{} templates found ({}); choose one with --template or set default_template",
                ids.len(),
                ids.join(", ")
            ),
        }
    }
}

/// Gets the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

    Ok(home_dir.join(CONFIG_FILE_NAME))
}
