//! Explainable credit scoring.
//!
//! A profile is turned into a fixed feature vector, scored by a boosted-tree regressor that is
//! bootstrapped from synthetic data when no persisted model exists, and decomposed into
//! rule-based sub-scores, narrative fragments, recommendations and risk flags. Scenario
//! simulation perturbs a profile and re-scores it to report the delta.

pub mod advice;
pub mod assessment;
pub mod config;
pub mod error;
pub mod features;
pub mod format;
pub mod model;
pub mod narration;
pub mod service;
pub mod simulation;
pub mod telemetry;

pub use assessment::{AssessmentEngine, AssessmentResult, FactorScores, RiskCategory};
pub use features::{EducationLevel, FeatureVector, HousingStatus, Profile};
pub use model::{ModelHandle, ScorePredictor, ScoringError};
pub use narration::{Narrator, TemplateGenerator, TextGenerator};
pub use service::CreditService;
pub use simulation::{InvalidScenario, ScenarioEngine, SimulationError, SimulationResult};
