use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::model::TrainingConfig;

/// Distinguishes runtime behavior for different stages of the service.
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

/// Top-level configuration for the scoring core.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub model: ModelConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let models_dir = env::var("CREDIT_MODELS_DIR").unwrap_or_else(|_| "models".to_string());

        let defaults = TrainingConfig::default();
        let rows = parse_var("CREDIT_TRAINING_ROWS", defaults.rows)?;
        if rows < MIN_TRAINING_ROWS {
            return Err(ConfigError::TooFewTrainingRows { rows });
        }
        let seed = parse_var("CREDIT_TRAINING_SEED", defaults.seed)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            model: ModelConfig {
                models_dir: PathBuf::from(models_dir),
                training: TrainingConfig {
                    rows,
                    seed,
                    ..defaults
                },
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

const MIN_TRAINING_ROWS: usize = 50;

fn parse_var<T: std::str::FromStr>(variable: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { variable }),
        Err(_) => Ok(default),
    }
}

/// Where the persisted model lives and how to train one when it is missing.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub training: TrainingConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models"),
            training: TrainingConfig::default(),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { variable: &'static str },
    TooFewTrainingRows { rows: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a non-negative integer")
            }
            ConfigError::TooFewTrainingRows { rows } => write!(
                f,
                "CREDIT_TRAINING_ROWS must be at least {MIN_TRAINING_ROWS} (found {rows})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("CREDIT_MODELS_DIR");
        env::remove_var("CREDIT_TRAINING_ROWS");
        env::remove_var("CREDIT_TRAINING_SEED");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.model.models_dir, PathBuf::from("models"));
        assert_eq!(config.model.training.rows, 10_000);
        assert_eq!(config.model.training.seed, 42);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn reads_training_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "prod");
        env::set_var("CREDIT_TRAINING_ROWS", "2500");
        env::set_var("CREDIT_TRAINING_SEED", "7");
        env::set_var("CREDIT_MODELS_DIR", "/var/lib/credit");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.model.training.rows, 2500);
        assert_eq!(config.model.training.seed, 7);
        assert_eq!(config.model.models_dir, PathBuf::from("/var/lib/credit"));
        reset_env();
    }

    #[test]
    fn rejects_malformed_row_count() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("CREDIT_TRAINING_ROWS", "lots");
        let err = AppConfig::load().expect_err("non-numeric rows rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                variable: "CREDIT_TRAINING_ROWS"
            }
        ));

        env::set_var("CREDIT_TRAINING_ROWS", "10");
        let err = AppConfig::load().expect_err("tiny datasets rejected");
        assert!(matches!(err, ConfigError::TooFewTrainingRows { rows: 10 }));
        reset_env();
    }
}
