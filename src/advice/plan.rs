use serde::{Deserialize, Serialize};

use super::owned;
use crate::assessment::AssessmentResult;

pub const TARGET_SCORE: f64 = 750.0;
const TIMELINE_MONTHS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyGoal {
    pub month: u32,
    pub target_score: f64,
    pub focus_areas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyMilestone {
    pub quarter: u32,
    pub target_score: f64,
    pub key_actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessMetrics {
    pub credit_utilization_target: String,
    pub payment_history_target: String,
    pub savings_rate_target: String,
    pub debt_to_income_target: String,
}

impl Default for SuccessMetrics {
    fn default() -> Self {
        Self {
            credit_utilization_target: "Below 30%".to_string(),
            payment_history_target: "100% on-time payments".to_string(),
            savings_rate_target: "20% of income".to_string(),
            debt_to_income_target: "Below 36%".to_string(),
        }
    }
}

/// Twelve-month path from the current score to the excellent band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImprovementPlan {
    pub current_score: f64,
    pub target_score: f64,
    pub points_needed: f64,
    pub timeline_months: u32,
    pub monthly_goals: Vec<MonthlyGoal>,
    pub quarterly_milestones: Vec<QuarterlyMilestone>,
    pub success_metrics: SuccessMetrics,
}

fn focus_areas(month: u32) -> Vec<String> {
    match month {
        1..=3 => owned(&["Payment history", "Credit utilization", "Emergency fund"]),
        4..=6 => owned(&["Debt reduction", "Income increase", "Credit mix"]),
        7..=9 => owned(&[
            "Credit history length",
            "New credit applications",
            "Financial stability",
        ]),
        _ => owned(&["Maintenance", "Optimization", "Long-term planning"]),
    }
}

fn quarterly_actions(quarter: u32) -> Vec<String> {
    match quarter {
        1 => owned(&[
            "Set up automatic payments",
            "Reduce credit card balances",
            "Create emergency fund",
        ]),
        2 => owned(&[
            "Apply for credit limit increases",
            "Diversify credit mix",
            "Increase income streams",
        ]),
        3 => owned(&[
            "Monitor credit report",
            "Optimize credit utilization",
            "Plan major purchases",
        ]),
        _ => owned(&[
            "Maintain excellent habits",
            "Review and adjust goals",
            "Plan for next year",
        ]),
    }
}

impl ImprovementPlan {
    pub fn build(assessment: &AssessmentResult) -> Self {
        Self::for_score(assessment.score)
    }

    pub fn for_score(current_score: f64) -> Self {
        let points_needed = (TARGET_SCORE - current_score).max(0.0);
        let per_month = points_needed / f64::from(TIMELINE_MONTHS);

        let monthly_goals = (1..=TIMELINE_MONTHS)
            .map(|month| MonthlyGoal {
                month,
                target_score: (current_score + per_month * f64::from(month)).min(TARGET_SCORE),
                focus_areas: focus_areas(month),
            })
            .collect();

        let quarterly_milestones = (1..=4)
            .map(|quarter| QuarterlyMilestone {
                quarter,
                target_score: (current_score + per_month * f64::from(quarter * 3))
                    .min(TARGET_SCORE),
                key_actions: quarterly_actions(quarter),
            })
            .collect();

        Self {
            current_score,
            target_score: TARGET_SCORE,
            points_needed,
            timeline_months: TIMELINE_MONTHS,
            monthly_goals,
            quarterly_milestones,
            success_metrics: SuccessMetrics::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spreads_points_evenly_over_a_year() {
        let plan = ImprovementPlan::for_score(630.0);
        assert_eq!(plan.points_needed, 120.0);
        assert_eq!(plan.monthly_goals.len(), 12);
        assert_eq!(plan.monthly_goals[0].target_score, 640.0);
        assert_eq!(plan.monthly_goals[11].target_score, 750.0);
        assert_eq!(plan.quarterly_milestones[1].target_score, 690.0);
        assert_eq!(plan.monthly_goals[4].focus_areas[0], "Debt reduction");
        assert_eq!(plan.quarterly_milestones[3].key_actions[2], "Plan for next year");
    }

    #[test]
    fn excellent_scores_need_no_points_and_keep_their_level() {
        let plan = ImprovementPlan::for_score(790.0);
        assert_eq!(plan.points_needed, 0.0);
        assert!(plan
            .monthly_goals
            .iter()
            .all(|goal| goal.target_score == TARGET_SCORE));
        assert_eq!(plan.success_metrics.debt_to_income_target, "Below 36%");
    }
}
