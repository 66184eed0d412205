//! Template text and threshold rules layered over the sub-scores. Nothing here consults the
//! regression model.

use serde::{Deserialize, Serialize};

use super::FactorScores;
use crate::features::{DerivedRatios, Profile};
use crate::format::{currency, percent};

pub const DEFAULT_RECOMMENDATION: &str =
    "Your credit profile looks good! Keep maintaining healthy financial habits";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialFactors {
    pub income_expense_ratio: String,
    pub savings_rate: String,
    pub credit_utilization: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerFactors {
    pub experience: String,
    pub salary: String,
    pub stability: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousingFactors {
    pub status: String,
    pub property_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialFactors {
    pub education: String,
    pub age: String,
    pub social_score: String,
}

/// One narrative fragment per input behind each sub-score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    pub financial_factors: FinancialFactors,
    pub career_factors: CareerFactors,
    pub housing_factors: HousingFactors,
    pub social_factors: SocialFactors,
}

impl FactorBreakdown {
    pub fn describe(profile: &Profile) -> Self {
        let ratios = DerivedRatios::for_profile(profile);

        let property_value = if profile.property_value > 0.0 {
            format!("Property value: {}", currency(profile.property_value))
        } else {
            "No property owned".to_string()
        };

        Self {
            financial_factors: FinancialFactors {
                income_expense_ratio: format!(
                    "Your income is {:.1}x your expenses",
                    ratios.income_expense_ratio
                ),
                savings_rate: format!(
                    "You save {} monthly",
                    currency(profile.monthly_income - profile.monthly_expenses)
                ),
                credit_utilization: format!(
                    "Credit utilization: {}",
                    percent(ratios.credit_utilization, 1)
                ),
            },
            career_factors: CareerFactors {
                experience: format!("{} years of experience", profile.years_experience),
                salary: format!("Annual salary: {}", currency(profile.salary)),
                stability: format!(
                    "Job stability score: {}",
                    percent(profile.job_stability_score, 0)
                ),
            },
            housing_factors: HousingFactors {
                status: format!("Housing status: {}", profile.housing_status),
                property_value,
            },
            social_factors: SocialFactors {
                education: format!("Education: {}", profile.education_level),
                age: format!("Age: {}", profile.age),
                social_score: format!("Social score: {}", percent(profile.social_score, 0)),
            },
        }
    }
}

/// Threshold-driven suggestions; never empty.
pub fn rule_recommendations(profile: &Profile, scores: &FactorScores) -> Vec<String> {
    let mut recommendations = Vec::new();

    if scores.financial < 50.0 {
        recommendations
            .push("Consider reducing monthly expenses to improve your financial score".to_string());
        recommendations.push("Focus on building emergency savings".to_string());
    }

    if profile.credit_card_balance > profile.credit_card_limit * 0.3 {
        recommendations.push("Reduce credit card utilization to below 30%".to_string());
    }

    if scores.career < 50.0 {
        recommendations
            .push("Consider upskilling or pursuing additional certifications".to_string());
        recommendations.push("Look for opportunities to increase your salary".to_string());
    }

    if scores.housing < 50.0 {
        recommendations
            .push("Consider homeownership as it typically improves credit scores".to_string());
    }

    if recommendations.is_empty() {
        recommendations.push(DEFAULT_RECOMMENDATION.to_string());
    }

    recommendations
}

/// Independent risk flags; an empty list means nothing tripped.
pub fn risk_factors(profile: &Profile) -> Vec<String> {
    let mut flags = Vec::new();

    if profile.late_payments > 0 {
        flags.push(format!(
            "{} late payments in recent history",
            profile.late_payments
        ));
    }
    if profile.missed_payments > 0 {
        flags.push(format!("{} missed payments", profile.missed_payments));
    }
    if profile.credit_card_balance > profile.credit_card_limit * 0.8 {
        flags.push("High credit card utilization".to_string());
    }
    if profile.monthly_expenses > profile.monthly_income * 0.9 {
        flags.push("High debt-to-income ratio".to_string());
    }
    if profile.job_stability_score < 0.3 {
        flags.push("Low job stability".to_string());
    }

    flags
}
