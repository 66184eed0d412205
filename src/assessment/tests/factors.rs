use super::common::*;
use crate::assessment::FactorScores;
use crate::features::{EducationLevel, HousingStatus, Profile};

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

#[test]
fn sample_profile_sub_scores_follow_the_formulas() {
    let scores = FactorScores::calculate(&sample_profile());

    let expected_financial =
        50.0 + 20.0 * (6250.0 / 3801.0) + 15.0 - 30.0 * (2500.0 / 10_001.0) - 10.0;
    assert!(close(scores.financial, expected_financial));
    assert!((scores.financial - 80.39).abs() < 0.01);
    assert!(close(scores.career, 97.5));
    assert!(close(scores.housing, 30.0));
    assert!(close(scores.social, 77.5));
}

#[test]
fn sub_scores_clamp_to_bounds() {
    let rich = Profile {
        monthly_income: 50_000.0,
        monthly_expenses: 100.0,
        savings_balance: 1_000_000.0,
        years_experience: 40.0,
        salary: 900_000.0,
        job_stability_score: 1.0,
        housing_status: HousingStatus::Owned,
        property_value: 10_000_000.0,
        education_level: EducationLevel::Phd,
        age: 90,
        social_score: 1.0,
        ..Profile::default()
    };
    let scores = FactorScores::calculate(&rich);
    assert_eq!(scores.financial, 100.0);
    assert_eq!(scores.career, 100.0);
    assert_eq!(scores.housing, 100.0);
    assert_eq!(scores.social, 100.0);

    let strained = Profile {
        credit_card_balance: 9_000.0,
        credit_card_limit: 1_000.0,
        late_payments: 12,
        salary: -2_000_000.0,
        ..Profile::default()
    };
    let scores = FactorScores::calculate(&strained);
    assert_eq!(scores.financial, 0.0);
    assert_eq!(scores.career, 0.0);
}

#[test]
fn young_high_school_applicant_loses_social_points() {
    let profile = Profile {
        age: 18,
        social_score: 0.0,
        ..Profile::default()
    };
    assert!(close(FactorScores::calculate(&profile).social, 26.5));
}

#[test]
fn non_finite_inputs_still_land_in_range() {
    let profile = Profile {
        savings_balance: f64::NAN,
        salary: f64::INFINITY,
        property_value: f64::NEG_INFINITY,
        ..Profile::default()
    };
    let scores = FactorScores::calculate(&profile);
    for value in [scores.financial, scores.career, scores.housing, scores.social] {
        assert!((0.0..=100.0).contains(&value));
    }
}
