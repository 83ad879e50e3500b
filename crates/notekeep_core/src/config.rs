//! Host configuration: storage backend selection and logging settings.
//!
//! Read from a TOML file chosen by the host. A missing file yields defaults;
//! a malformed one is an error rather than a silent fallback.

use crate::logging::LogLevel;
use crate::persist::SaveMode;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_COLLECTION_KEY: &str = "notes";
const DEFAULT_IO_TIMEOUT_MS: u64 = 5_000;

/// Which persistence adapter the host should construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One JSON file per collection key.
    #[default]
    File,
    /// `kv_entries` table in a SQLite database.
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendKind,
    /// Directory for the file backend, database file for the SQLite backend.
    /// Falls back to the platform data directory when unset.
    pub location: Option<PathBuf>,
    pub collection_key: String,
    /// Upper bound on lock waits, in milliseconds.
    pub io_timeout_ms: u64,
    pub save_mode: SaveModeConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            location: None,
            collection_key: DEFAULT_COLLECTION_KEY.to_string(),
            io_timeout_ms: DEFAULT_IO_TIMEOUT_MS,
            save_mode: SaveModeConfig::default(),
        }
    }
}

impl StorageConfig {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    /// Effective storage location: configured, else under the data dir.
    pub fn resolved_location(&self) -> Option<PathBuf> {
        if let Some(location) = &self.location {
            return Some(location.clone());
        }
        let data_dir = data_dir()?;
        Some(match self.backend {
            BackendKind::File => data_dir,
            BackendKind::Sqlite => data_dir.join("notekeep.sqlite3"),
        })
    }
}

/// Serde mirror of [`SaveMode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveModeConfig {
    #[default]
    Merge,
    Replace,
}

impl From<SaveModeConfig> for SaveMode {
    fn from(value: SaveModeConfig) -> Self {
        match value {
            SaveModeConfig::Merge => SaveMode::Merge,
            SaveModeConfig::Replace => SaveMode::Replace,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<LogLevel>,
    /// Absolute directory for rolling logs; logging stays off when unset.
    pub dir: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn effective_level(&self) -> LogLevel {
        self.level.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Checks values serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.collection_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.collection_key must not be empty".to_string(),
            ));
        }
        if self.storage.io_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "storage.io_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if let Some(dir) = &self.logging.dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "logging.dir must be absolute, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }
}

/// Loads config from `path`. Returns defaults when the file does not exist.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(err) => return Err(ConfigError::Read(path.to_path_buf(), err)),
    };
    parse_config(&raw)
}

/// Parses and validates config text.
pub fn parse_config(raw: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(raw).map_err(ConfigError::Parse)?;
    config.validate()?;
    Ok(config)
}

/// Platform data directory for notekeep.
///
/// Lookup only; backends create the directory when they first write.
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("app", "notekeep", "notekeep")
        .map(|dirs| dirs.data_local_dir().to_path_buf())
}

#[derive(Debug)]
pub enum ConfigError {
    Read(PathBuf, std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(path, err) => write!(f, "failed to read config `{}`: {err}", path.display()),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(_, err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}
