//! Configuration management (config.toml)
//!
//! Holds the market rate table and the analyser settings. Every field has a
//! default, so an empty or partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::GameEdition;
use crate::economy::{MarketError, MarketRates};

/// Config file name inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Spendlog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Market rate table
    #[serde(default)]
    pub market: MarketRates,
    /// Analyser settings
    #[serde(default)]
    pub analyser: AnalyserConfig,
}

/// Analyser settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyserConfig {
    /// Game edition whose cost data is loaded (default: de)
    #[serde(default)]
    pub edition: GameEdition,
    /// Directory holding the halfon data files (default: halfon/data)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Replace human player names with `P<n>` (default: false)
    #[serde(default)]
    pub privacy: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("halfon/data")
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            edition: GameEdition::default(),
            data_dir: default_data_dir(),
            privacy: false,
        }
    }
}

/// Config errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Market(#[from] MarketError),
}

impl Config {
    /// Parse and validate a TOML config
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.market.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load a config file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        tracing::info!(
            "Loaded config from {} (market rates {})",
            path.display(),
            config.market.version
        );
        Ok(config)
    }

    /// Load the config from `path` if given, else from the user config
    /// directory, else fall back to defaults
    ///
    /// An explicit path must exist; the user config file may be absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_from(path);
        }

        match config_dir().map(|dir| dir.join(CONFIG_FILE)) {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                tracing::debug!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Data file for the configured edition
    pub fn catalog_path(&self) -> PathBuf {
        self.analyser
            .data_dir
            .join(self.analyser.edition.data_file_name())
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\spendlog\spendlog\config`
/// On macOS: `~/Library/Application Support/io.spendlog.spendlog`
/// On Linux: `~/.config/spendlog`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "spendlog", "spendlog")
        .map(|dirs| dirs.config_dir().to_path_buf())
}
