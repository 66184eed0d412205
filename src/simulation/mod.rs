//! What-if simulation: transform a baseline profile and re-score it.

mod scenario;

pub use scenario::{
    score_change_statement, FactorChanges, InvalidScenario, Scenario, ScenarioKind,
    ScenarioParameters, Transformation,
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assessment::{AssessmentEngine, FactorScores, RiskCategory};
use crate::features::Profile;
use crate::model::ScoringError;

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    InvalidScenario(#[from] InvalidScenario),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl SimulationError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, SimulationError::InvalidScenario(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub scenario_type: ScenarioKind,
    pub parameters: ScenarioParameters,
    pub original_score: f64,
    pub simulated_score: f64,
    pub score_change: f64,
    pub simulated_risk_category: RiskCategory,
    pub simulated_factor_scores: FactorScores,
    pub factor_changes: FactorChanges,
    pub recommendations: Vec<String>,
    pub simulated_profile: Profile,
    pub model_version: String,
}

/// Applies scenarios and re-scores through the same engine used for assessments.
#[derive(Clone)]
pub struct ScenarioEngine {
    engine: AssessmentEngine,
}

impl ScenarioEngine {
    pub fn new(engine: AssessmentEngine) -> Self {
        Self { engine }
    }

    /// Re-scores `baseline` under the named scenario and reports the change against a
    /// previously computed `baseline_score`.
    pub fn simulate(
        &self,
        baseline: &Profile,
        baseline_score: f64,
        scenario_type: &str,
        parameters: &ScenarioParameters,
    ) -> Result<SimulationResult, SimulationError> {
        let scenario = Scenario::parse(scenario_type, parameters)?;
        info!(scenario = scenario.kind().as_str(), baseline_score, "starting simulation");

        let Transformation {
            profile,
            factor_changes,
        } = scenario.apply(baseline);
        let card = self.engine.score(&profile);
        let score_change = card.score - baseline_score;

        let recommendations = vec![
            score_change_statement(score_change),
            scenario.remark(score_change).to_string(),
        ];

        info!(
            scenario = scenario.kind().as_str(),
            simulated_score = card.score,
            score_change,
            "simulation completed"
        );

        Ok(SimulationResult {
            scenario_type: scenario.kind(),
            parameters: parameters.clone(),
            original_score: baseline_score,
            simulated_score: card.score,
            score_change,
            simulated_risk_category: card.risk_category,
            simulated_factor_scores: card.factor_scores,
            factor_changes,
            recommendations,
            simulated_profile: profile,
            model_version: self.engine.model_version().to_string(),
        })
    }

    /// Like [`simulate`](Self::simulate) but scores the baseline as well, for callers without
    /// a stored baseline score.
    pub fn compare(
        &self,
        baseline: &Profile,
        scenario_type: &str,
        parameters: &ScenarioParameters,
    ) -> Result<SimulationResult, SimulationError> {
        // parse first so an unknown type never costs a scoring pass
        Scenario::parse(scenario_type, parameters)?;
        let baseline_score = self.engine.score(baseline).score;
        self.simulate(baseline, baseline_score, scenario_type, parameters)
    }
}
