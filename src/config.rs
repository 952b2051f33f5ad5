use crate::estimation::model::EstimationParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_DATA_FILE_PATH: &str = "data/pen_data.json";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
/// Selects an alternate config file.
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
/// Overrides `[data].path`.
pub const DATA_FILE_PATH_ENV: &str = "DATA_FILE_PATH";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub data: Option<DataSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub estimation: Option<EstimationSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataSection {
    /// JSON file holding the activity log of every pen
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EstimationSection {
    pub initial_level: Option<f64>,
    pub consumption_rate_per_second: Option<f64>,
    pub replacement_threshold: Option<f64>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config file location, honouring `CONFIG_PATH`.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(config_path())
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    /// Returns the data file path, with `DATA_FILE_PATH` taking precedence.
    pub fn data_path(&self) -> PathBuf {
        resolve_data_path(
            self.configured_data_path(),
            std::env::var(DATA_FILE_PATH_ENV).ok(),
        )
    }

    fn configured_data_path(&self) -> Option<&Path> {
        let path = self.data.as_ref()?.path.as_deref()?;
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Returns the estimation parameters, falling back to defaults per field.
    ///
    /// Values that would let the ink level leave `0..=initial_level` are rejected.
    pub fn estimation_params(&self) -> Result<EstimationParams, ConfigError> {
        let defaults = EstimationParams::default();
        let Some(section) = self.estimation.as_ref() else {
            return Ok(defaults);
        };
        let params = EstimationParams {
            initial_level: section.initial_level.unwrap_or(defaults.initial_level),
            consumption_rate_per_second: section
                .consumption_rate_per_second
                .unwrap_or(defaults.consumption_rate_per_second),
            replacement_threshold: section
                .replacement_threshold
                .unwrap_or(defaults.replacement_threshold),
        };
        validate_estimation_params(&params)?;
        Ok(params)
    }

    /// Returns the configured log level, or `INFO` if it does not parse.
    pub fn log_level(&self) -> tracing::Level {
        self.logging.level.parse().unwrap_or(tracing::Level::INFO)
    }
}

fn validate_estimation_params(params: &EstimationParams) -> Result<(), ConfigError> {
    let EstimationParams {
        initial_level,
        consumption_rate_per_second,
        replacement_threshold,
    } = *params;

    if !(initial_level > 0.0 && initial_level <= 100.0) {
        return Err(ConfigError::Invalid(format!(
            "estimation.initial_level must be in (0, 100], got {initial_level}"
        )));
    }
    if !(consumption_rate_per_second.is_finite() && consumption_rate_per_second > 0.0) {
        return Err(ConfigError::Invalid(format!(
            "estimation.consumption_rate_per_second must be positive, got {}",
            consumption_rate_per_second
        )));
    }
    if !(replacement_threshold >= 0.0 && replacement_threshold <= initial_level) {
        return Err(ConfigError::Invalid(format!(
            "estimation.replacement_threshold must be in [0, {}], got {}",
            initial_level, replacement_threshold
        )));
    }
    Ok(())
}

fn resolve_data_path(configured: Option<&Path>, env_override: Option<String>) -> PathBuf {
    match env_override.filter(|path| !path.is_empty()) {
        Some(path) => PathBuf::from(path),
        None => configured
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE_PATH)),
    }
}
