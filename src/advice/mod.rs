//! Longer-form guidance built on top of a finished assessment.

mod plan;
mod report;

pub use plan::{ImprovementPlan, MonthlyGoal, QuarterlyMilestone, SuccessMetrics, TARGET_SCORE};
pub use report::RecommendationReport;

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
