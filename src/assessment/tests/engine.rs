use super::common::*;
use crate::assessment::{rule_recommendations, FactorScores, RiskCategory, CONFIDENCE};
use crate::features::Profile;
use crate::model::MODEL_VERSION;

#[test]
fn assessment_combines_model_and_rules() {
    let engine = engine();
    let profile = sample_profile();

    let result = engine.assess(&profile);

    assert!((300.0..=850.0).contains(&result.score));
    assert_eq!(result.risk_category, RiskCategory::from_score(result.score));
    assert_eq!(result.confidence, CONFIDENCE);
    assert_eq!(result.model_version, MODEL_VERSION);
    assert_eq!(result.factor_scores, FactorScores::calculate(&profile));
    assert_eq!(
        result.recommendations,
        rule_recommendations(&profile, &result.factor_scores)
    );
    assert_eq!(result.risk_factors, vec!["1 late payments in recent history".to_string()]);
    assert!(result.explanation.starts_with("Your credit score of"));
    assert!(result.risk_analysis.contains("1 late payments in recent history"));
}

#[test]
fn score_card_matches_full_assessment() {
    let engine = engine();
    let profile = strong_owner_profile();
    let card = engine.score(&profile);
    let result = engine.assess(&profile);
    assert_eq!(card.score, result.score);
    assert_eq!(card.risk_category, result.risk_category);
}

#[test]
fn default_profile_is_scored_without_failing() {
    let result = engine().assess(&Profile::default());
    assert!((300.0..=850.0).contains(&result.score));
    assert!(result.risk_factors.is_empty());
    assert!(!result.recommendations.is_empty());
}
