use crate::config::ConfigError;
use crate::model::{ModelError, ScoringError};
use crate::simulation::SimulationError;
use crate::telemetry::TelemetryError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Model(ModelError),
    Scoring(ScoringError),
    Simulation(SimulationError),
}

impl AppError {
    /// Client-input failures a caller should report back rather than retry or page on.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::Simulation(err) if err.is_client_error())
    }

    /// Failures that clear up on their own, such as the model still training.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Scoring(err) => err.is_retryable(),
            AppError::Simulation(SimulationError::Scoring(err)) => err.is_retryable(),
            _ => false,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Model(err) => write!(f, "model error: {}", err),
            AppError::Scoring(err) => write!(f, "scoring error: {}", err),
            AppError::Simulation(err) => write!(f, "simulation error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Model(err) => Some(err),
            AppError::Scoring(err) => Some(err),
            AppError::Simulation(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<ModelError> for AppError {
    fn from(value: ModelError) -> Self {
        Self::Model(value)
    }
}

impl From<ScoringError> for AppError {
    fn from(value: ScoringError) -> Self {
        Self::Scoring(value)
    }
}

impl From<SimulationError> for AppError {
    fn from(value: SimulationError) -> Self {
        Self::Simulation(value)
    }
}
