use std::sync::{Arc, OnceLock};

use crate::assessment::AssessmentEngine;
use crate::features::{EducationLevel, HousingStatus, Profile};
use crate::model::{BoostingParams, ScorePredictor, TrainingConfig};
use crate::narration::Narrator;

pub(super) fn sample_profile() -> Profile {
    Profile {
        monthly_income: 6250.0,
        monthly_expenses: 3800.0,
        savings_balance: 15_000.0,
        credit_card_balance: 2500.0,
        credit_card_limit: 10_000.0,
        late_payments: 1,
        missed_payments: 0,
        years_experience: 8.0,
        salary: 75_000.0,
        job_stability_score: 0.8,
        housing_status: HousingStatus::Renting,
        education_level: EducationLevel::Bachelors,
        age: 32,
        social_score: 0.7,
        ..Profile::default()
    }
}

pub(super) fn strong_owner_profile() -> Profile {
    Profile {
        housing_status: HousingStatus::Owned,
        property_value: 350_000.0,
        credit_card_balance: 500.0,
        ..sample_profile()
    }
}

pub(super) fn predictor() -> Arc<ScorePredictor> {
    static PREDICTOR: OnceLock<Arc<ScorePredictor>> = OnceLock::new();
    PREDICTOR
        .get_or_init(|| {
            let config = TrainingConfig {
                rows: 600,
                boosting: BoostingParams {
                    rounds: 25,
                    max_depth: 4,
                    ..BoostingParams::default()
                },
                ..TrainingConfig::default()
            };
            Arc::new(ScorePredictor::train(&config).expect("small model trains"))
        })
        .clone()
}

pub(super) fn engine() -> AssessmentEngine {
    AssessmentEngine::new(predictor(), Arc::new(Narrator::template_only()))
}
