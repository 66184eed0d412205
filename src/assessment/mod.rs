//! Full scoring pass: model score, rule-based sub-scores, risk band and narrative output.

mod explain;
mod factors;
mod risk;

#[cfg(test)]
mod tests;

pub use explain::{
    risk_factors, rule_recommendations, CareerFactors, FactorBreakdown, FinancialFactors,
    HousingFactors, SocialFactors, DEFAULT_RECOMMENDATION,
};
pub use factors::FactorScores;
pub use risk::RiskCategory;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::features::Profile;
use crate::model::ScorePredictor;
use crate::narration::Narrator;

/// Fixed placeholder; the regressor exposes no calibrated uncertainty.
pub const CONFIDENCE: f64 = 0.85;

/// Numeric half of an assessment, without any text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub score: f64,
    pub risk_category: RiskCategory,
    pub factor_scores: FactorScores,
}

/// Output of one scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub score: f64,
    pub risk_category: RiskCategory,
    pub confidence: f64,
    pub factor_scores: FactorScores,
    pub factor_breakdown: FactorBreakdown,
    pub explanation: String,
    pub risk_analysis: String,
    pub recommendations: Vec<String>,
    pub risk_factors: Vec<String>,
    pub model_version: String,
}

/// Stateless evaluator over a shared, read-only predictor.
#[derive(Clone)]
pub struct AssessmentEngine {
    predictor: Arc<ScorePredictor>,
    narrator: Arc<Narrator>,
}

impl AssessmentEngine {
    pub fn new(predictor: Arc<ScorePredictor>, narrator: Arc<Narrator>) -> Self {
        Self {
            predictor,
            narrator,
        }
    }

    pub fn predictor(&self) -> &ScorePredictor {
        &self.predictor
    }

    pub fn model_version(&self) -> &str {
        self.predictor.version()
    }

    pub fn score(&self, profile: &Profile) -> ScoreCard {
        let score = self.predictor.predict(profile);
        ScoreCard {
            score,
            risk_category: RiskCategory::from_score(score),
            factor_scores: FactorScores::calculate(profile),
        }
    }

    pub fn assess(&self, profile: &Profile) -> AssessmentResult {
        let card = self.score(profile);
        let flags = risk_factors(profile);
        let recommendations = self.narrator.recommendations(
            profile,
            &card.factor_scores,
            &flags,
            rule_recommendations(profile, &card.factor_scores),
        );
        let explanation = self.narrator.explanation(
            profile,
            card.score,
            &card.factor_scores,
            card.risk_category,
        );
        let risk_analysis = self.narrator.risk_analysis(
            profile,
            &card.factor_scores,
            card.risk_category,
            &flags,
        );

        debug!(
            score = card.score,
            risk_category = card.risk_category.as_str(),
            risk_factors = flags.len(),
            "profile assessed"
        );

        AssessmentResult {
            score: card.score,
            risk_category: card.risk_category,
            confidence: CONFIDENCE,
            factor_scores: card.factor_scores,
            factor_breakdown: FactorBreakdown::describe(profile),
            explanation,
            risk_analysis,
            recommendations,
            risk_factors: flags,
            model_version: self.model_version().to_string(),
        }
    }
}
