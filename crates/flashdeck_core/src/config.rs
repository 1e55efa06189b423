//! Startup configuration read from environment variables.
//!
//! # Responsibility
//! - Turn `FLASHDECK_*` variables into typed backend and logging settings.
//!
//! # Invariants
//! - Only the binary reads the process environment; library code receives
//!   an `AppConfig` value.
//! - Unset variables fall back to defaults; set-but-invalid values fail.

use crate::logging::{LogLevel, LogSettings};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_BACKEND: &str = "FLASHDECK_BACKEND";
pub const ENV_DB_PATH: &str = "FLASHDECK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "FLASHDECK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "FLASHDECK_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "flashdeck.sqlite3";

/// Which persistence backend to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// SQLite database file, created if missing.
    SqliteFile(PathBuf),
    /// Private in-memory SQLite database.
    SqliteMemory,
    /// Document store; persisted to the JSON file when a path is given.
    Documents(Option<PathBuf>),
}

impl BackendConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SqliteFile(_) => "sqlite",
            Self::SqliteMemory => "memory",
            Self::Documents(_) => "documents",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub log_level: LogLevel,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        variable: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                variable,
                value,
                reason,
            } => write!(f, "invalid {variable}=`{value}`: {reason}"),
        }
    }
}

impl Error for ConfigError {}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(ENV_DB_PATH).map(PathBuf::from);
        let backend = match read(ENV_BACKEND).as_deref() {
            None | Some("sqlite") => BackendConfig::SqliteFile(
                db_path.unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            ),
            Some("memory") => {
                if let Some(path) = db_path {
                    return Err(ConfigError::InvalidValue {
                        variable: ENV_DB_PATH,
                        value: path.display().to_string(),
                        reason: "the memory backend takes no path".to_string(),
                    });
                }
                BackendConfig::SqliteMemory
            }
            Some("documents") => BackendConfig::Documents(db_path),
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    variable: ENV_BACKEND,
                    value: other.to_string(),
                    reason: "expected sqlite|memory|documents".to_string(),
                })
            }
        };

        let log_level = match read(ENV_LOG_LEVEL) {
            None => LogLevel::default_for_build(),
            Some(value) => value
                .parse::<LogLevel>()
                .map_err(|err| ConfigError::InvalidValue {
                    variable: ENV_LOG_LEVEL,
                    value: value.clone(),
                    reason: err.to_string(),
                })?,
        };

        let log_dir = read(ENV_LOG_DIR).map(PathBuf::from);
        if let Some(dir) = &log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    variable: ENV_LOG_DIR,
                    value: dir.display().to_string(),
                    reason: "must be an absolute path".to_string(),
                });
            }
        }

        Ok(Self {
            backend,
            log_level,
            log_dir,
        })
    }

    /// Logging settings, when a log directory is configured.
    pub fn log_settings(&self) -> Option<LogSettings> {
        self.log_dir
            .as_ref()
            .map(|dir| LogSettings::new(self.log_level, dir.clone()))
    }
}
