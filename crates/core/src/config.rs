//! Application configuration layered from a TOML file and `GOLF18_*` variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::history::RECENT_ROUNDS;

/// Directory under the platform config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "golf18";

/// Prefix for environment overrides, e.g. `GOLF18_DATA_ROOT`.
pub const ENV_PREFIX: &str = "GOLF18";

const DEFAULT_CONFIG: &str = r#"# golf18 configuration

# Directory holding the JSON data store.
# data_root = "/home/me/.local/share/golf18"

# Key (file name) the courses, rounds and settings are saved under.
store_key = "golfData"

# Directory for log files. Defaults to <data_root>/logs.
# log_dir = "/tmp/golf18-logs"

# Number of recent hole scores used for trends.
recent_rounds = 5
"#;

/// Runtime settings for the store, logging and history window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_root")]
    /// Directory holding the JSON store.
    pub data_root: PathBuf,
    #[serde(default = "default_store_key")]
    /// Key the data aggregate is saved under.
    pub store_key: String,
    #[serde(default)]
    /// Log directory override.
    pub log_dir: Option<PathBuf>,
    #[serde(default = "default_recent_rounds")]
    /// Hole scores kept in a hole's recent history.
    pub recent_rounds: usize,
}

fn default_data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

fn default_store_key() -> String {
    "golfData".to_string()
}

fn default_recent_rounds() -> usize {
    RECENT_ROUNDS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            store_key: default_store_key(),
            log_dir: None,
            recent_rounds: default_recent_rounds(),
        }
    }
}

impl AppConfig {
    /// Load from the default config file and environment.
    pub fn load() -> Self {
        Self::load_from(config_path())
    }

    /// Load from `path` (optional) and environment. Unusable input falls
    /// back to defaults with a warning.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let built = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|settings| settings.try_deserialize::<AppConfig>());
        match built {
            Ok(config) => config.normalized(),
            Err(err) => {
                warn!("ignoring configuration from {}: {err}", path.display());
                Self::default()
            }
        }
    }

    fn normalized(mut self) -> Self {
        if self.store_key.trim().is_empty() {
            warn!("store_key is empty; using {}", default_store_key());
            self.store_key = default_store_key();
        }
        if self.recent_rounds == 0 {
            warn!("recent_rounds must be positive; using {RECENT_ROUNDS}");
            self.recent_rounds = RECENT_ROUNDS;
        }
        self
    }

    /// Directory for log files.
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.data_root.join("logs"))
    }
}

/// Location of the user's config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join("config.toml")
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    ensure_default_config_at(&path)?;
    Ok(path)
}

/// Write the default config to `path` unless the file already exists.
pub fn ensure_default_config_at(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(true)
}
