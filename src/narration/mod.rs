//! Natural-language narration with a deterministic fallback.
//!
//! An enhanced [`TextGenerator`] (for example an LLM adapter supplied by the host) may be
//! plugged into [`Narrator`]. Every call site falls back to [`TemplateGenerator`] when the
//! enhanced provider is missing, unavailable, errors, or returns something unusable, so
//! generation failures never reach callers.

mod template;

pub use template::{TemplateGenerator, GENERIC_EXPLANATION};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::assessment::{FactorScores, RiskCategory};
use crate::features::{EducationLevel, HousingStatus, Profile};

const MAX_RECOMMENDATIONS: usize = 5;

/// What the generator is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    CreditExplanation,
    Recommendations,
    RiskAnalysis,
    ScenarioAnalysis,
    SyntheticProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    pub context: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("text generator is not configured")]
    Unconfigured,
    #[error("text provider failed: {0}")]
    Provider(String),
    #[error("text provider returned an unusable response: {0}")]
    MalformedResponse(String),
}

/// Capability interface for text generation collaborators.
pub trait TextGenerator: Send + Sync {
    fn provider(&self) -> &str;
    fn is_available(&self) -> bool;
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioImpact {
    Positive,
    Negative,
    Neutral,
}

/// Structured what-if commentary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub impact_score: ScenarioImpact,
    pub estimated_score_change: f64,
    pub reasoning: String,
    pub recommendations: Vec<String>,
    pub timeline: String,
}

impl ScenarioAnalysis {
    pub fn neutral(reasoning: &str) -> Self {
        Self {
            impact_score: ScenarioImpact::Neutral,
            estimated_score_change: 0.0,
            reasoning: reasoning.to_string(),
            recommendations: vec![
                "Consult with a financial advisor for scenario planning".to_string(),
            ],
            timeline: "short-term".to_string(),
        }
    }
}

/// Inputs for [`Narrator::scenario_analysis`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioContext {
    pub credit_score: f64,
    pub financial_score: f64,
    pub career_score: f64,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub score_change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrationStatus {
    pub enhanced_available: bool,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticProfile {
    pub profile: Profile,
    pub generated: bool,
}

/// Profile used when no generator can produce a synthetic one.
pub fn demo_profile() -> Profile {
    Profile {
        age: 35,
        monthly_income: 5000.0,
        monthly_expenses: 3000.0,
        savings_balance: 10_000.0,
        credit_card_balance: 2000.0,
        credit_card_limit: 8000.0,
        loan_balance: 15_000.0,
        late_payments: 1,
        missed_payments: 0,
        years_experience: 8.0,
        salary: 60_000.0,
        job_stability_score: 0.7,
        housing_status: HousingStatus::Renting,
        monthly_rent: 1500.0,
        mortgage_payment: 0.0,
        property_value: 0.0,
        education_level: EducationLevel::Bachelors,
        social_score: 0.6,
        ..Profile::default()
    }
}

fn scores_json(scores: &FactorScores) -> Value {
    json!({
        "financial": scores.financial,
        "career": scores.career,
        "housing": scores.housing,
        "social": scores.social,
    })
}

/// Routes narration requests to the enhanced provider when it is usable, else to templates.
pub struct Narrator {
    enhanced: Option<Arc<dyn TextGenerator>>,
    template: TemplateGenerator,
}

impl Default for Narrator {
    fn default() -> Self {
        Self::template_only()
    }
}

impl Narrator {
    pub fn template_only() -> Self {
        Self {
            enhanced: None,
            template: TemplateGenerator,
        }
    }

    pub fn with_enhanced(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            enhanced: Some(generator),
            template: TemplateGenerator,
        }
    }

    pub fn status(&self) -> NarrationStatus {
        match self.usable_enhanced() {
            Some(generator) => NarrationStatus {
                enhanced_available: true,
                provider: Some(generator.provider().to_string()),
            },
            None => NarrationStatus {
                enhanced_available: false,
                provider: None,
            },
        }
    }

    fn usable_enhanced(&self) -> Option<&Arc<dyn TextGenerator>> {
        self.enhanced
            .as_ref()
            .filter(|generator| generator.is_available())
    }

    fn enhanced_text(&self, request: &GenerationRequest) -> Option<String> {
        let generator = self.usable_enhanced()?;
        match generator.generate(request) {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                warn!(
                    provider = generator.provider(),
                    kind = ?request.kind,
                    "text provider returned empty output, using template"
                );
                None
            }
            Err(err) => {
                warn!(
                    provider = generator.provider(),
                    kind = ?request.kind,
                    error = %err,
                    "text provider failed, using template"
                );
                None
            }
        }
    }

    fn template_text(&self, request: &GenerationRequest) -> Option<String> {
        match self.template.generate(request) {
            Ok(text) => Some(text),
            Err(err) => {
                debug!(kind = ?request.kind, error = %err, "template rendering failed");
                None
            }
        }
    }

    fn render(&self, request: &GenerationRequest) -> Option<String> {
        self.enhanced_text(request)
            .or_else(|| self.template_text(request))
    }

    pub fn explanation(
        &self,
        profile: &Profile,
        score: f64,
        scores: &FactorScores,
        category: RiskCategory,
    ) -> String {
        let request = GenerationRequest {
            kind: GenerationKind::CreditExplanation,
            context: json!({
                "credit_score": score,
                "risk_category": category.as_str(),
                "factor_scores": scores_json(scores),
                "age": profile.age,
                "monthly_income": profile.monthly_income,
                "monthly_expenses": profile.monthly_expenses,
                "housing_status": profile.housing_status.label(),
                "years_experience": profile.years_experience,
                "education_level": profile.education_level.label(),
            }),
        };
        self.render(&request)
            .unwrap_or_else(|| GENERIC_EXPLANATION.to_string())
    }

    /// Enhanced suggestions parsed from a numbered or bulleted list, else `fallback` unchanged.
    pub fn recommendations(
        &self,
        profile: &Profile,
        scores: &FactorScores,
        risk_factors: &[String],
        fallback: Vec<String>,
    ) -> Vec<String> {
        let request = GenerationRequest {
            kind: GenerationKind::Recommendations,
            context: json!({
                "factor_scores": scores_json(scores),
                "risk_factors": risk_factors,
                "recommendations": fallback,
                "age": profile.age,
                "monthly_income": profile.monthly_income,
                "monthly_expenses": profile.monthly_expenses,
                "savings_balance": profile.savings_balance,
                "credit_card_balance": profile.credit_card_balance,
                "credit_card_limit": profile.credit_card_limit,
                "housing_status": profile.housing_status.label(),
                "years_experience": profile.years_experience,
            }),
        };

        let parsed = self
            .enhanced_text(&request)
            .map(|text| parse_list(&text))
            .unwrap_or_default();
        if parsed.is_empty() {
            fallback
        } else {
            parsed
        }
    }

    pub fn risk_analysis(
        &self,
        profile: &Profile,
        scores: &FactorScores,
        category: RiskCategory,
        risk_factors: &[String],
    ) -> String {
        let request = GenerationRequest {
            kind: GenerationKind::RiskAnalysis,
            context: json!({
                "risk_category": category.as_str(),
                "risk_factors": risk_factors,
                "factor_scores": scores_json(scores),
                "monthly_income": profile.monthly_income,
                "monthly_expenses": profile.monthly_expenses,
                "credit_card_balance": profile.credit_card_balance,
                "credit_card_limit": profile.credit_card_limit,
                "late_payments": profile.late_payments,
                "missed_payments": profile.missed_payments,
            }),
        };
        self.render(&request).unwrap_or_else(|| {
            "Risk assessment based on financial behavior, career stability, and credit history."
                .to_string()
        })
    }

    pub fn scenario_analysis(&self, scenario: &str, context: &ScenarioContext) -> ScenarioAnalysis {
        let mut payload = serde_json::to_value(context).unwrap_or_else(|_| json!({}));
        if let Value::Object(map) = &mut payload {
            map.insert("scenario".to_string(), Value::String(scenario.to_string()));
        }
        let request = GenerationRequest {
            kind: GenerationKind::ScenarioAnalysis,
            context: payload,
        };

        let from_enhanced = self
            .enhanced_text(&request)
            .and_then(|text| parse_embedded_json::<ScenarioAnalysis>(&text));
        from_enhanced
            .or_else(|| {
                self.template_text(&request)
                    .and_then(|text| parse_embedded_json(&text))
            })
            .unwrap_or_else(|| ScenarioAnalysis::neutral("Unable to analyze scenario at this time"))
    }

    pub fn synthetic_profile(&self) -> SyntheticProfile {
        let request = GenerationRequest {
            kind: GenerationKind::SyntheticProfile,
            context: Value::Null,
        };
        match self
            .enhanced_text(&request)
            .and_then(|text| parse_embedded_json::<Profile>(&text))
        {
            Some(profile) => SyntheticProfile {
                profile,
                generated: true,
            },
            None => SyntheticProfile {
                profile: demo_profile(),
                generated: false,
            },
        }
    }
}

/// Keeps list-shaped lines (`1.`, `2)`, `-`, `*`, `•`), strips their markers, caps at five.
fn parse_list(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| strip_marker(line.trim()))
        .filter(|item| !item.is_empty())
        .take(MAX_RECOMMENDATIONS)
        .map(str::to_string)
        .collect()
}

fn strip_marker(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix(['-', '*', '•']) {
        return Some(rest.trim());
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    Some(rest.strip_prefix(['.', ')', ':']).unwrap_or(rest).trim())
}

/// Parses the span between the first `{` and the last `}`.
fn parse_embedded_json<T: serde::de::DeserializeOwned>(text: &str) -> Option<T> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    match serde_json::from_str(&text[start..=end]) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(error = %err, "generated JSON could not be parsed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted {
        available: bool,
        reply: Result<String, String>,
    }

    impl Scripted {
        fn replying(text: &str) -> Arc<dyn TextGenerator> {
            Arc::new(Self {
                available: true,
                reply: Ok(text.to_string()),
            })
        }

        fn failing() -> Arc<dyn TextGenerator> {
            Arc::new(Self {
                available: true,
                reply: Err("upstream timeout".to_string()),
            })
        }
    }

    impl TextGenerator for Scripted {
        fn provider(&self) -> &str {
            "scripted"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            self.reply.clone().map_err(GenerationError::Provider)
        }
    }

    fn scores() -> FactorScores {
        FactorScores {
            financial: 80.0,
            career: 95.0,
            housing: 30.0,
            social: 77.5,
        }
    }

    #[test]
    fn template_only_status_reports_no_provider() {
        let status = Narrator::template_only().status();
        assert!(!status.enhanced_available);
        assert_eq!(status.provider, None);

        let unavailable = Narrator::with_enhanced(Arc::new(Scripted {
            available: false,
            reply: Ok("ignored".to_string()),
        }));
        assert!(!unavailable.status().enhanced_available);
    }

    #[test]
    fn template_explanation_names_strongest_and_weakest_areas() {
        let text = Narrator::template_only().explanation(
            &Profile::default(),
            712.4,
            &scores(),
            RiskCategory::Good,
        );
        assert!(text.starts_with("Your credit score of 712 falls in the good range."));
        assert!(text.contains("strongest area is career stability (95/100)"));
        assert!(text.contains("housing situation (30/100)"));
        assert!(text.ends_with(GENERIC_EXPLANATION));
    }

    #[test]
    fn failing_provider_falls_back_to_template() {
        let narrator = Narrator::with_enhanced(Scripted::failing());
        assert_eq!(narrator.status().provider.as_deref(), Some("scripted"));

        let fallback = vec!["Focus on building emergency savings".to_string()];
        let recs = narrator.recommendations(&Profile::default(), &scores(), &[], fallback.clone());
        assert_eq!(recs, fallback);

        let analysis = narrator.risk_analysis(
            &Profile::default(),
            &scores(),
            RiskCategory::Poor,
            &["Low job stability".to_string()],
        );
        assert!(analysis.starts_with("Overall risk level: High."));
        assert!(analysis.contains("Low job stability"));
    }

    #[test]
    fn enhanced_recommendations_are_parsed_and_capped() {
        let narrator = Narrator::with_enhanced(Scripted::replying(
            "Here is your plan:\n1. Pay cards down to 30%\n2) Automate savings\n\
             - Review subscriptions\n\n3. Ask for a raise\n4. Keep old accounts open\n\
             5. Avoid new inquiries",
        ));
        let recs = narrator.recommendations(&Profile::default(), &scores(), &[], Vec::new());
        assert_eq!(
            recs,
            vec![
                "Pay cards down to 30%",
                "Automate savings",
                "Review subscriptions",
                "Ask for a raise",
                "Keep old accounts open",
            ]
        );
    }

    #[test]
    fn prose_without_list_markers_falls_back() {
        let narrator = Narrator::with_enhanced(Scripted::replying("Just keep doing what you do."));
        let fallback = vec!["Keep going".to_string()];
        assert_eq!(
            narrator.recommendations(&Profile::default(), &scores(), &[], fallback.clone()),
            fallback
        );
    }

    #[test]
    fn synthetic_profile_extracts_embedded_json() {
        let narrator = Narrator::with_enhanced(Scripted::replying(
            "Sure! ```json\n{\"age\": 41.0, \"monthly_income\": 7200, \"late_payments\": 2.0, \
             \"housing_status\": \"owned\"}\n```",
        ));
        let generated = narrator.synthetic_profile();
        assert!(generated.generated);
        assert_eq!(generated.profile.age, 41);
        assert_eq!(generated.profile.late_payments, 2);
        assert_eq!(generated.profile.housing_status, HousingStatus::Owned);
        assert_eq!(generated.profile.credit_card_limit, 1.0);
    }

    #[test]
    fn synthetic_profile_falls_back_to_demo() {
        let generated =
            Narrator::with_enhanced(Scripted::replying("no json here")).synthetic_profile();
        assert!(!generated.generated);
        assert_eq!(generated.profile, demo_profile());
        assert_eq!(generated.profile.education_level, EducationLevel::Bachelors);
    }

    #[test]
    fn scenario_analysis_uses_supplied_change_or_stays_neutral() {
        let narrator = Narrator::template_only();
        let mut context = ScenarioContext {
            credit_score: 680.0,
            financial_score: 70.0,
            career_score: 90.0,
            monthly_income: 6250.0,
            monthly_expenses: 3800.0,
            score_change: Some(12.4),
        };
        let analysis = narrator.scenario_analysis("salary_increase", &context);
        assert_eq!(analysis.impact_score, ScenarioImpact::Positive);
        assert_eq!(analysis.estimated_score_change, 12.0);

        context.score_change = None;
        let analysis = narrator.scenario_analysis("moving abroad", &context);
        assert_eq!(analysis.impact_score, ScenarioImpact::Neutral);
        assert_eq!(analysis.estimated_score_change, 0.0);
    }

    #[test]
    fn malformed_enhanced_scenario_json_uses_template() {
        let narrator = Narrator::with_enhanced(Scripted::replying("{not json}"));
        let context = ScenarioContext {
            credit_score: 640.0,
            financial_score: 40.0,
            career_score: 60.0,
            monthly_income: 4000.0,
            monthly_expenses: 3900.0,
            score_change: Some(-8.0),
        };
        let analysis = narrator.scenario_analysis("house_purchase", &context);
        assert_eq!(analysis.impact_score, ScenarioImpact::Negative);
    }
}
