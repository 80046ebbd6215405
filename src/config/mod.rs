use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::catalog::CorruptRecordPolicy;

// Top-level configuration, one section per concern
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

// Where the catalog and the reservation log live
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub catalog_path: PathBuf,
    pub reservation_log_path: PathBuf,
    pub on_corrupt_record: CorruptRecordPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected 'text' or 'json', got '{}'", other)),
        }
    }
}

#[derive(Debug, Error)]
#[error("{var} is invalid: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            app: AppConfig {
                environment: var("ENVIRONMENT", "development"),
                rust_log: var("RUST_LOG", "seat_booking=info"),
                log_format: parse("LOG_FORMAT", &var("LOG_FORMAT", "text"))?,
            },
            storage: StorageConfig {
                catalog_path: var("CATALOG_PATH", "./data/events_data.txt").into(),
                reservation_log_path: var("RESERVATION_LOG_PATH", "./data/reservations.jsonl").into(),
                on_corrupt_record: parse("CATALOG_ON_CORRUPT", &var("CATALOG_ON_CORRUPT", "abort"))?,
            },
        })
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(|reason| ConfigError { var, reason })
}
