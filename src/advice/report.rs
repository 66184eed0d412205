use serde::{Deserialize, Serialize};

use super::owned;
use crate::assessment::{AssessmentResult, RiskCategory};
use crate::features::{HousingStatus, Profile};

const AT_RISK_PRIORITIES: [&str; 4] = [
    "Focus on reducing high-interest debt immediately",
    "Establish emergency savings fund",
    "Review and reduce monthly expenses",
    "Consider credit counseling services",
];

const FAIR_PRIORITIES: [&str; 4] = [
    "Improve credit utilization ratio",
    "Build consistent payment history",
    "Increase savings rate",
    "Monitor credit report regularly",
];

const HEALTHY_PRIORITIES: [&str; 4] = [
    "Maintain current healthy financial habits",
    "Consider investment opportunities",
    "Explore premium credit products",
    "Plan for major purchases",
];

const FINANCIAL_ACTIONS: [&str; 4] = [
    "Create a detailed budget and track all expenses",
    "Set up automatic savings transfers",
    "Pay more than minimum on credit cards",
    "Consider debt consolidation options",
];

const CAREER_ACTIONS: [&str; 4] = [
    "Consider professional development opportunities",
    "Research salary benchmarks for your role",
    "Build industry-specific skills",
    "Network within your professional community",
];

const RENTER_HOUSING: [&str; 3] = [
    "Consider homeownership when financially ready",
    "Build savings for down payment",
    "Improve credit score to qualify for better mortgage rates",
];

const MORTGAGED_HOUSING: [&str; 3] = [
    "Consider refinancing if rates are favorable",
    "Make extra mortgage payments when possible",
    "Maintain property value through regular maintenance",
];

const LONG_TERM_GOALS: [&str; 5] = [
    "Build 6-month emergency fund",
    "Achieve excellent credit score (750+)",
    "Diversify income sources",
    "Plan for retirement savings",
    "Consider investment portfolio",
];

const IMMEDIATE_ACTIONS: [&str; 5] = [
    "Review current credit report",
    "Set up payment reminders",
    "Create monthly budget",
    "Automate bill payments",
    "Start emergency fund",
];

/// Grouped recommendations for one assessed profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub credit_score: f64,
    pub risk_category: RiskCategory,
    pub priority_recommendations: Vec<String>,
    pub financial_recommendations: Vec<String>,
    pub career_recommendations: Vec<String>,
    pub housing_recommendations: Vec<String>,
    pub long_term_goals: Vec<String>,
    pub immediate_actions: Vec<String>,
    pub specific_recommendations: Vec<String>,
    pub risk_factors: Vec<String>,
}

impl RecommendationReport {
    pub fn build(assessment: &AssessmentResult, profile: &Profile) -> Self {
        let scores = &assessment.factor_scores;

        let priority_recommendations = match assessment.risk_category {
            RiskCategory::VeryPoor | RiskCategory::Poor => owned(&AT_RISK_PRIORITIES),
            RiskCategory::Fair => owned(&FAIR_PRIORITIES),
            RiskCategory::Good | RiskCategory::Excellent => owned(&HEALTHY_PRIORITIES),
        };

        let mut financial_recommendations = Vec::new();
        if scores.financial < 60.0 {
            financial_recommendations.extend(owned(&FINANCIAL_ACTIONS));
        }
        if profile.credit_card_balance != 0.0 && profile.credit_card_limit != 0.0 {
            let utilization = profile.credit_card_balance / profile.credit_card_limit;
            if utilization > 0.3 {
                financial_recommendations.push(format!(
                    "Reduce credit card utilization from {:.1}% to below 30%",
                    utilization * 100.0
                ));
            }
        }

        let mut career_recommendations = Vec::new();
        if scores.career < 60.0 {
            career_recommendations.extend(owned(&CAREER_ACTIONS));
        }
        if profile.years_experience > 0.0 && profile.years_experience < 3.0 {
            career_recommendations
                .push("Focus on building experience and expertise in your field".to_string());
        }

        let housing_recommendations = if scores.housing < 50.0 {
            match profile.housing_status {
                HousingStatus::Renting => owned(&RENTER_HOUSING),
                HousingStatus::Mortgaged => owned(&MORTGAGED_HOUSING),
                HousingStatus::Owned => Vec::new(),
            }
        } else {
            Vec::new()
        };

        Self {
            credit_score: assessment.score,
            risk_category: assessment.risk_category,
            priority_recommendations,
            financial_recommendations,
            career_recommendations,
            housing_recommendations,
            long_term_goals: owned(&LONG_TERM_GOALS),
            immediate_actions: owned(&IMMEDIATE_ACTIONS),
            specific_recommendations: assessment.recommendations.clone(),
            risk_factors: assessment.risk_factors.clone(),
        }
    }
}
