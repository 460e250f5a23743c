use crate::pipeline::{default_output_dir, default_raw_dir};
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub paths: PathsConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("COMPASS_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let raw_dir = dir_from_env("COMPASS_RAW_DIR", default_raw_dir)?;
        let output_dir = dir_from_env("COMPASS_OUTPUT_DIR", default_output_dir)?;

        let log_level = env::var("COMPASS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            paths: PathsConfig {
                raw_dir,
                output_dir,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn dir_from_env(
    variable: &'static str,
    default: fn() -> PathBuf,
) -> Result<PathBuf, ConfigError> {
    match env::var(variable) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::EmptyPath { variable }),
        Ok(value) => Ok(PathBuf::from(value.trim())),
        Err(env::VarError::NotPresent) => Ok(default()),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode { variable }),
    }
}

/// Where raw inputs are read from and prepared outputs are written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    pub raw_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    EmptyPath { variable: &'static str },
    NotUnicode { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyPath { variable } => {
                write!(f, "{variable} must name a directory when set")
            }
            ConfigError::NotUnicode { variable } => {
                write!(f, "{variable} must be valid unicode")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
