use serde_json::Value;

use super::{
    demo_profile, GenerationError, GenerationKind, GenerationRequest, ScenarioAnalysis,
    ScenarioImpact, TextGenerator,
};

pub const GENERIC_EXPLANATION: &str =
    "We've calculated your credit score based on multiple factors including your financial \
     health, career stability, housing situation, and social indicators.";

const FACTOR_LABELS: [(&str, &str); 4] = [
    ("financial", "financial health"),
    ("career", "career stability"),
    ("housing", "housing situation"),
    ("social", "social indicators"),
];

/// Deterministic renderer used whenever no enhanced provider is configured or it fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

impl TextGenerator for TemplateGenerator {
    fn provider(&self) -> &str {
        "template"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let context = &request.context;
        match request.kind {
            GenerationKind::CreditExplanation => Ok(credit_explanation(context)),
            GenerationKind::Recommendations => Ok(numbered_list(context)),
            GenerationKind::RiskAnalysis => Ok(risk_analysis(context)),
            GenerationKind::ScenarioAnalysis => serde_json::to_string(&scenario_analysis(context))
                .map_err(|err| GenerationError::MalformedResponse(err.to_string())),
            GenerationKind::SyntheticProfile => serde_json::to_string(&demo_profile())
                .map_err(|err| GenerationError::MalformedResponse(err.to_string())),
        }
    }
}

fn number(context: &Value, key: &str) -> Option<f64> {
    context.get(key).and_then(Value::as_f64)
}

fn strings(context: &Value, key: &str) -> Vec<String> {
    context
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Labelled sub-scores present in the context, in fixed factor order.
fn factor_scores(context: &Value) -> Vec<(&'static str, f64)> {
    let Some(scores) = context.get("factor_scores") else {
        return Vec::new();
    };
    FACTOR_LABELS
        .iter()
        .filter_map(|(key, label)| number(scores, key).map(|score| (*label, score)))
        .collect()
}

fn credit_explanation(context: &Value) -> String {
    let score = number(context, "credit_score");
    let category = context.get("risk_category").and_then(Value::as_str);
    let (Some(score), Some(category)) = (score, category) else {
        return GENERIC_EXPLANATION.to_string();
    };

    let mut text = format!(
        "Your credit score of {score:.0} falls in the {} range.",
        category.replace('_', " ")
    );

    let scores = factor_scores(context);
    let strongest = scores.iter().max_by(|a, b| a.1.total_cmp(&b.1));
    let weakest = scores.iter().min_by(|a, b| a.1.total_cmp(&b.1));
    if let (Some(strongest), Some(weakest)) = (strongest, weakest) {
        if strongest.0 != weakest.0 {
            text.push_str(&format!(
                " Your strongest area is {} ({:.0}/100), while {} ({:.0}/100) has the most \
                 room to improve.",
                strongest.0, strongest.1, weakest.0, weakest.1
            ));
        }
    }

    text.push(' ');
    text.push_str(GENERIC_EXPLANATION);
    text
}

fn numbered_list(context: &Value) -> String {
    strings(context, "recommendations")
        .iter()
        .enumerate()
        .map(|(index, item)| format!("{}. {}", index + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

fn risk_level(category: &str) -> &'static str {
    match category {
        "excellent" | "good" => "Low",
        "fair" => "Medium",
        _ => "High",
    }
}

fn risk_analysis(context: &Value) -> String {
    let category = context
        .get("risk_category")
        .and_then(Value::as_str)
        .unwrap_or("fair");
    let mut text = format!("Overall risk level: {}.", risk_level(category));

    let flags = strings(context, "risk_factors");
    if flags.is_empty() {
        text.push_str(" No major risk factors were identified.");
    } else {
        text.push_str(&format!(" Primary risk factors: {}.", flags.join("; ")));
    }

    let strengths: Vec<&str> = factor_scores(context)
        .into_iter()
        .filter(|(_, score)| *score >= 70.0)
        .map(|(label, _)| label)
        .collect();
    if !strengths.is_empty() {
        text.push_str(&format!(" Mitigating strengths: {}.", strengths.join(", ")));
    }

    text
}

fn scenario_analysis(context: &Value) -> ScenarioAnalysis {
    let Some(change) = number(context, "score_change") else {
        return ScenarioAnalysis::neutral(
            "No simulated score change was supplied for this scenario",
        );
    };

    let (impact, recommendation) = if change >= 0.5 {
        (
            ScenarioImpact::Positive,
            "Pursue this change if it fits your budget and timeline",
        )
    } else if change <= -0.5 {
        (
            ScenarioImpact::Negative,
            "Weigh the added obligations before committing to this change",
        )
    } else {
        (
            ScenarioImpact::Neutral,
            "Focus on payment history and credit utilization for larger gains",
        )
    };

    ScenarioAnalysis {
        impact_score: impact,
        estimated_score_change: change.round(),
        reasoning: format!(
            "Re-scoring the modified profile moves the credit score by {change:+.0} points"
        ),
        recommendations: vec![recommendation.to_string()],
        timeline: "medium-term".to_string(),
    }
}
