//! CLI configuration
//!
//! Layered lowest to highest: built-in defaults, YAML file, `INVENTORY_*`
//! environment variables, command-line flags.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// File name looked up in the working directory and then in `$HOME`
pub const CONFIG_FILE_NAME: &str = ".inventory.yaml";

/// Database file inside the data directory
pub const DB_FILE_NAME: &str = "inventory.db";

pub const ENV_DATA_DIR: &str = "INVENTORY_DATA_DIR";
pub const ENV_DEBUG: &str = "INVENTORY_DEBUG";
pub const ENV_LOG_FORMAT: &str = "INVENTORY_LOG_FORMAT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// Resolved CLI configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub debug: bool,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            debug: false,
            log_format: LogFormat::Text,
        }
    }
}

/// Values given on the command line; `None`/`false` means not given
#[derive(Debug, Clone, Default)]
pub struct FlagOverrides {
    pub data_dir: Option<PathBuf>,
    pub debug: bool,
}

impl Config {
    /// Resolve the configuration from every layer
    ///
    /// # Errors
    ///
    /// Fails if an explicit config file cannot be read, any config file does
    /// not parse, or an environment variable holds an invalid value.
    pub fn load(explicit: Option<&Path>, flags: &FlagOverrides) -> Result<Self, ConfigError> {
        let mut config = match locate(explicit) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        config.apply_flags(flags);
        Ok(config)
    }

    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns `Read` or `Parse` for the file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        // an empty file means all defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `INVENTORY_*` overrides read through `lookup`
    ///
    /// # Errors
    ///
    /// Returns `InvalidEnv` for an unparseable debug flag or log format.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup(ENV_DEBUG) {
            self.debug = parse_bool(&value).ok_or(ConfigError::InvalidEnv {
                var: ENV_DEBUG,
                value,
            })?;
        }
        if let Some(value) = lookup(ENV_LOG_FORMAT) {
            self.log_format = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_LOG_FORMAT,
                value,
            })?;
        }
        Ok(())
    }

    pub fn apply_flags(&mut self, flags: &FlagOverrides) {
        if let Some(dir) = &flags.data_dir {
            self.data_dir = dir.clone();
        }
        if flags.debug {
            self.debug = true;
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}

/// The explicit path, else the first existing default location
fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
