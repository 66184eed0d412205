use std::sync::Arc;

use tracing::info;

use crate::advice::{ImprovementPlan, RecommendationReport};
use crate::assessment::{AssessmentEngine, AssessmentResult};
use crate::config::AppConfig;
use crate::features::Profile;
use crate::model::{ModelHandle, ScoringError};
use crate::narration::{
    NarrationStatus, Narrator, ScenarioAnalysis, ScenarioContext, SyntheticProfile,
};
use crate::simulation::{
    Scenario, ScenarioEngine, ScenarioParameters, SimulationError, SimulationResult,
};

/// Entry point for hosts: owns the model handle and narrator and hands out engines once the
/// model is ready.
#[derive(Clone)]
pub struct CreditService {
    model: Arc<ModelHandle>,
    narrator: Arc<Narrator>,
}

impl CreditService {
    pub fn new(model: Arc<ModelHandle>, narrator: Arc<Narrator>) -> Self {
        Self { model, narrator }
    }

    pub fn from_config(config: &AppConfig, narrator: Narrator) -> Self {
        Self::new(
            Arc::new(ModelHandle::new(config.model.clone())),
            Arc::new(narrator),
        )
    }

    pub async fn initialize(&self) -> Result<(), ScoringError> {
        let predictor = self.model.initialize().await?;
        info!(version = predictor.version(), "credit service ready");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_ready()
    }

    pub fn narration_status(&self) -> NarrationStatus {
        self.narrator.status()
    }

    fn engine(&self) -> Result<AssessmentEngine, ScoringError> {
        let predictor = self.model.predictor()?;
        Ok(AssessmentEngine::new(predictor, Arc::clone(&self.narrator)))
    }

    pub fn assess(&self, profile: &Profile) -> Result<AssessmentResult, ScoringError> {
        Ok(self.engine()?.assess(profile))
    }

    pub fn simulate(
        &self,
        baseline: &Profile,
        baseline_score: f64,
        scenario_type: &str,
        parameters: &ScenarioParameters,
    ) -> Result<SimulationResult, SimulationError> {
        Scenario::parse(scenario_type, parameters)?;
        ScenarioEngine::new(self.engine()?).simulate(
            baseline,
            baseline_score,
            scenario_type,
            parameters,
        )
    }

    pub fn compare(
        &self,
        baseline: &Profile,
        scenario_type: &str,
        parameters: &ScenarioParameters,
    ) -> Result<SimulationResult, SimulationError> {
        Scenario::parse(scenario_type, parameters)?;
        ScenarioEngine::new(self.engine()?).compare(baseline, scenario_type, parameters)
    }

    pub fn recommendation_report(
        &self,
        profile: &Profile,
    ) -> Result<RecommendationReport, ScoringError> {
        let assessment = self.assess(profile)?;
        Ok(RecommendationReport::build(&assessment, profile))
    }

    pub fn improvement_plan(&self, profile: &Profile) -> Result<ImprovementPlan, ScoringError> {
        let card = self.engine()?.score(profile);
        Ok(ImprovementPlan::for_score(card.score))
    }

    /// Free-form what-if commentary. When the description names a known scenario and carries
    /// its parameters, the simulated change is passed along to the narrator.
    pub fn analyze_scenario(
        &self,
        description: &str,
        profile: &Profile,
        parameters: &ScenarioParameters,
    ) -> Result<ScenarioAnalysis, ScoringError> {
        let engine = self.engine()?;
        let card = engine.score(profile);
        let score_change = ScenarioEngine::new(engine)
            .simulate(profile, card.score, description, parameters)
            .ok()
            .map(|result| result.score_change);

        let context = ScenarioContext {
            credit_score: card.score,
            financial_score: card.factor_scores.financial,
            career_score: card.factor_scores.career,
            monthly_income: profile.monthly_income,
            monthly_expenses: profile.monthly_expenses,
            score_change,
        };
        Ok(self.narrator.scenario_analysis(description, &context))
    }

    pub fn synthetic_profile(&self) -> SyntheticProfile {
        self.narrator.synthetic_profile()
    }
}
