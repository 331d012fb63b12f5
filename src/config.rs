use crate::booking::DEFAULT_BOOKING_KIND;
use crate::calendar::WorkCalendarConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "PROJECT_LINES_CONFIG";
pub const DATABASE_ENV: &str = "PROJECT_LINES_DB";
pub const HTTP_ADDR_ENV: &str = "PROJECT_LINES_HTTP_ADDR";
pub const BOOKING_KIND_ENV: &str = "PROJECT_LINES_BOOKING_KIND";
pub const LOG_FILTER_ENV: &str = "PROJECT_LINES_LOG";

/// Planner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// SQLite database; the in-memory store is used when unset
    pub database_path: Option<PathBuf>,
    /// Listen address of the HTTP API
    pub http_addr: String,
    /// `kind` written on every booking the planner creates
    pub booking_kind: String,
    /// Default tracing filter when `RUST_LOG` is not set
    pub log_filter: String,
    /// Calendar used to expand date spans into working days
    pub calendar: WorkCalendarConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            http_addr: "0.0.0.0:3000".to_string(),
            booking_kind: DEFAULT_BOOKING_KIND.to_string(),
            log_filter: "info".to_string(),
            calendar: WorkCalendarConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl PlannerConfig {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Same as [`PlannerConfig::load`] with an explicit environment lookup.
    pub fn load_with<F>(config_path: Option<PathBuf>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let path = config_path.or_else(|| env(CONFIG_PATH_ENV).map(PathBuf::from));
        if let Some(path) = path {
            if path.exists() {
                let contents = std::fs::read_to_string(&path).map_err(|source| {
                    ConfigError::Read {
                        path: path.clone(),
                        source,
                    }
                })?;
                config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: path.clone(),
                    source,
                })?;
            }
        }

        if let Some(db_path) = env(DATABASE_ENV) {
            config.database_path = Some(PathBuf::from(db_path));
        }
        if let Some(addr) = env(HTTP_ADDR_ENV) {
            config.http_addr = addr;
        }
        if let Some(kind) = env(BOOKING_KIND_ENV) {
            config.booking_kind = kind;
        }
        if let Some(filter) = env(LOG_FILTER_ENV) {
            config.log_filter = filter;
        }

        Ok(config)
    }
}
