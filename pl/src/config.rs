//! Perflog configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::buffer::DEFAULT_LIMIT;
use crate::events::MethodNames;
use crate::mirror::{DEFAULT_STORE_NAME, store_path};

/// Main perflog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of retained rows
    pub limit: usize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Inbound method names
    pub methods: MethodNames,

    /// Persistence mirror
    pub persist: PersistConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            log_level: None,
            methods: MethodNames::default(),
            persist: PersistConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidate_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is initialized
    ///
    /// Errors are swallowed; a broken config file is reported later by [`Config::load`].
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let paths = match config_path {
            Some(path) => vec![path.clone()],
            None => Self::candidate_paths(),
        };

        paths
            .into_iter()
            .find(|p| p.exists())
            .and_then(|p| Self::load_from_file(p).ok())
            .and_then(|config| config.log_level)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).context(format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Project-local config, then user config
    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".perflog.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("perflog").join("perflog.yml"));
        }
        paths
    }
}

/// Persistence mirror configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// Mirror the buffer to disk and restore it on startup
    pub enabled: bool,

    /// Directory holding the mirror file
    pub dir: PathBuf,

    /// Store name; the file is `<dir>/<name>.jsonl`
    pub name: String,
}

impl PersistConfig {
    /// Path of the mirror file; nothing is created
    pub fn path(&self) -> PathBuf {
        store_path(&self.dir, &self.name)
    }
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("perflog"),
            name: DEFAULT_STORE_NAME.to_string(),
        }
    }
}
