use serde::{Deserialize, Serialize};

use crate::features::{DerivedRatios, EducationLevel, HousingStatus, Profile};

/// Rule-based sub-scores, each in [0, 100]. Computed from the raw profile only, never from the
/// regression model, so they stay stable across retraining.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    pub financial: f64,
    pub career: f64,
    pub housing: f64,
    pub social: f64,
}

impl FactorScores {
    pub fn calculate(profile: &Profile) -> Self {
        Self {
            financial: financial_score(profile),
            career: career_score(profile),
            housing: housing_score(profile),
            social: social_score(profile),
        }
    }
}

fn bounded(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

fn financial_score(profile: &Profile) -> f64 {
    let ratios = DerivedRatios::for_profile(profile);
    bounded(
        50.0 + ratios.income_expense_ratio * 20.0 + profile.savings_balance / 1000.0
            - ratios.credit_utilization * 30.0
            - f64::from(profile.late_payments) * 10.0,
    )
}

fn career_score(profile: &Profile) -> f64 {
    bounded(
        50.0 + profile.years_experience * 2.0
            + profile.salary / 10_000.0
            + profile.job_stability_score * 30.0,
    )
}

fn housing_base(status: HousingStatus) -> f64 {
    match status {
        HousingStatus::Renting => 30.0,
        HousingStatus::Owned => 80.0,
        HousingStatus::Mortgaged => 60.0,
    }
}

fn housing_score(profile: &Profile) -> f64 {
    bounded(housing_base(profile.housing_status) + profile.property_value / 100_000.0)
}

fn education_base(level: EducationLevel) -> f64 {
    match level {
        EducationLevel::HighSchool => 30.0,
        EducationLevel::Bachelors => 60.0,
        EducationLevel::Masters => 80.0,
        EducationLevel::Phd => 90.0,
    }
}

fn social_score(profile: &Profile) -> f64 {
    bounded(
        education_base(profile.education_level)
            + (f64::from(profile.age) - 25.0) * 0.5
            + profile.social_score * 20.0,
    )
}
