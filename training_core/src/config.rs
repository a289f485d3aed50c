//! Configuration file support.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/training/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub timers: TimerConfig,

    #[serde(default)]
    pub protocols: ProtocolConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Identity handed to the completion sink
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
        }
    }
}

/// Rest and countdown timing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimerConfig {
    /// Rest after a non-final exercise set when the block has no `rest_seconds`
    #[serde(default = "default_rest_seconds")]
    pub default_rest_seconds: u32,

    /// Rest after a non-final superset round
    #[serde(default = "default_rest_seconds")]
    pub superset_rest_seconds: u32,

    /// Number of final seconds of a countdown that play the audible cue
    #[serde(default = "default_cue_seconds")]
    pub cue_seconds: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_rest_seconds: default_rest_seconds(),
            superset_rest_seconds: default_rest_seconds(),
            cue_seconds: default_cue_seconds(),
        }
    }
}

/// Where daily protocol files are read from
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ProtocolConfig {
    /// Overrides `<data_dir>/protocols`
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("training")
}

fn default_user_id() -> String {
    "local".into()
}

fn default_rest_seconds() -> u32 {
    90
}

fn default_cue_seconds() -> u32 {
    5
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("training").join("config.toml")
    }

    /// Directory holding `<day>.toml` protocol files
    pub fn protocol_dir(&self) -> PathBuf {
        self.protocols
            .dir
            .clone()
            .unwrap_or_else(|| self.data.data_dir.join("protocols"))
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.user.user_id.trim().is_empty() {
            return Err(Error::Config("user.user_id must not be empty".into()));
        }
        Ok(())
    }
}
