use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::features::{HousingStatus, Profile};
use crate::format::{currency, signed_currency};

/// Raw scenario parameters as supplied by the caller.
pub type ScenarioParameters = BTreeMap<String, Value>;

/// Human-readable description of each changed input, keyed by field name.
pub type FactorChanges = BTreeMap<String, String>;

const DEFAULT_PROPERTY_VALUE: f64 = 300_000.0;
const DEFAULT_DOWN_PAYMENT: f64 = 60_000.0;
const DEFAULT_MONTHLY_PAYMENT: f64 = 1500.0;

/// Client-input failures while interpreting a scenario request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidScenario {
    #[error("unknown scenario type: {0}")]
    UnknownType(String),
    #[error("scenario {scenario} requires parameter {parameter}")]
    MissingParameter {
        scenario: &'static str,
        parameter: &'static str,
    },
    #[error("parameter {parameter} has invalid value {value}")]
    InvalidParameter { parameter: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    SalaryIncrease,
    JobChange,
    HousePurchase,
    DebtReduction,
    ExpenseReduction,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 5] = [
        ScenarioKind::SalaryIncrease,
        ScenarioKind::JobChange,
        ScenarioKind::HousePurchase,
        ScenarioKind::DebtReduction,
        ScenarioKind::ExpenseReduction,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ScenarioKind::SalaryIncrease => "salary_increase",
            ScenarioKind::JobChange => "job_change",
            ScenarioKind::HousePurchase => "house_purchase",
            ScenarioKind::DebtReduction => "debt_reduction",
            ScenarioKind::ExpenseReduction => "expense_reduction",
        }
    }
}

impl FromStr for ScenarioKind {
    type Err = InvalidScenario;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ScenarioKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| InvalidScenario::UnknownType(value.to_string()))
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed, validated scenario ready to apply to a profile.
#[derive(Debug, Clone, PartialEq)]
pub enum Scenario {
    SalaryIncrease {
        amount: f64,
    },
    JobChange {
        new_salary: Option<f64>,
        new_industry: Option<String>,
    },
    HousePurchase {
        property_value: f64,
        down_payment: f64,
        monthly_payment: f64,
    },
    DebtReduction {
        amount: f64,
    },
    ExpenseReduction {
        amount: f64,
    },
}

fn present<'a>(parameters: &'a ScenarioParameters, name: &str) -> Option<&'a Value> {
    parameters.get(name).filter(|value| !value.is_null())
}

fn optional_number(
    parameters: &ScenarioParameters,
    name: &str,
) -> Result<Option<f64>, InvalidScenario> {
    match present(parameters, name) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .filter(|number| number.is_finite())
            .map(Some)
            .ok_or_else(|| InvalidScenario::InvalidParameter {
                parameter: name.to_string(),
                value: value.to_string(),
            }),
    }
}

fn required_number(
    parameters: &ScenarioParameters,
    scenario: ScenarioKind,
    name: &'static str,
) -> Result<f64, InvalidScenario> {
    optional_number(parameters, name)?.ok_or(InvalidScenario::MissingParameter {
        scenario: scenario.as_str(),
        parameter: name,
    })
}

fn optional_text(
    parameters: &ScenarioParameters,
    name: &str,
) -> Result<Option<String>, InvalidScenario> {
    match present(parameters, name) {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Err(InvalidScenario::InvalidParameter {
            parameter: name.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Outcome of applying a scenario: the new profile plus what changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformation {
    pub profile: Profile,
    pub factor_changes: FactorChanges,
}

impl Scenario {
    /// The type is resolved before any parameter is inspected, so an unknown type is reported
    /// regardless of what else was supplied.
    pub fn parse(
        scenario_type: &str,
        parameters: &ScenarioParameters,
    ) -> Result<Self, InvalidScenario> {
        let kind: ScenarioKind = scenario_type.parse()?;
        let scenario = match kind {
            ScenarioKind::SalaryIncrease => Scenario::SalaryIncrease {
                amount: required_number(parameters, kind, "salary_increase")?,
            },
            ScenarioKind::JobChange => Scenario::JobChange {
                new_salary: optional_number(parameters, "new_salary")?,
                new_industry: optional_text(parameters, "new_industry")?,
            },
            ScenarioKind::HousePurchase => Scenario::HousePurchase {
                property_value: optional_number(parameters, "property_value")?
                    .unwrap_or(DEFAULT_PROPERTY_VALUE),
                down_payment: optional_number(parameters, "down_payment")?
                    .unwrap_or(DEFAULT_DOWN_PAYMENT),
                monthly_payment: optional_number(parameters, "monthly_payment")?
                    .unwrap_or(DEFAULT_MONTHLY_PAYMENT),
            },
            ScenarioKind::DebtReduction => Scenario::DebtReduction {
                amount: required_number(parameters, kind, "debt_reduction")?,
            },
            ScenarioKind::ExpenseReduction => Scenario::ExpenseReduction {
                amount: required_number(parameters, kind, "expense_reduction")?,
            },
        };
        Ok(scenario)
    }

    pub fn kind(&self) -> ScenarioKind {
        match self {
            Scenario::SalaryIncrease { .. } => ScenarioKind::SalaryIncrease,
            Scenario::JobChange { .. } => ScenarioKind::JobChange,
            Scenario::HousePurchase { .. } => ScenarioKind::HousePurchase,
            Scenario::DebtReduction { .. } => ScenarioKind::DebtReduction,
            Scenario::ExpenseReduction { .. } => ScenarioKind::ExpenseReduction,
        }
    }

    /// Applies the scenario to a copy of `baseline`; the baseline itself is left untouched.
    pub fn apply(&self, baseline: &Profile) -> Transformation {
        let mut profile = baseline.clone();
        let mut changes = FactorChanges::new();

        match self {
            Scenario::SalaryIncrease { amount } => {
                profile.salary += amount;
                profile.monthly_income += amount / 12.0;
                changes.insert("salary".into(), signed_currency(*amount));
                changes.insert("monthly_income".into(), signed_currency(amount / 12.0));
            }
            Scenario::JobChange {
                new_salary,
                new_industry,
            } => {
                let salary = new_salary.unwrap_or(baseline.salary);
                let industry = new_industry
                    .clone()
                    .unwrap_or_else(|| baseline.industry.clone());
                profile.salary = salary;
                profile.monthly_income = salary / 12.0;
                changes.insert(
                    "salary".into(),
                    format!("{} (was {})", currency(salary), currency(baseline.salary)),
                );
                changes.insert(
                    "industry".into(),
                    format!("{} (was {})", industry, baseline.industry),
                );
                profile.industry = industry;
            }
            Scenario::HousePurchase {
                property_value,
                down_payment,
                monthly_payment,
            } => {
                profile.housing_status = HousingStatus::Mortgaged;
                profile.property_value = *property_value;
                profile.mortgage_payment = *monthly_payment;
                profile.savings_balance -= down_payment;
                changes.insert(
                    "housing_status".into(),
                    format!("mortgaged (was {})", baseline.housing_status),
                );
                changes.insert("property_value".into(), currency(*property_value));
                changes.insert(
                    "mortgage_payment".into(),
                    format!("{} monthly", currency(*monthly_payment)),
                );
                changes.insert(
                    "savings_balance".into(),
                    format!("{} down payment", currency(-down_payment)),
                );
            }
            Scenario::DebtReduction { amount } => {
                profile.credit_card_balance = (baseline.credit_card_balance - amount).max(0.0);
                profile.savings_balance -= amount;
                changes.insert(
                    "credit_card_balance".into(),
                    signed_currency(profile.credit_card_balance - baseline.credit_card_balance),
                );
                changes.insert("savings_balance".into(), signed_currency(-amount));
            }
            Scenario::ExpenseReduction { amount } => {
                profile.monthly_expenses = (baseline.monthly_expenses - amount).max(0.0);
                changes.insert(
                    "monthly_expenses".into(),
                    signed_currency(profile.monthly_expenses - baseline.monthly_expenses),
                );
            }
        }

        Transformation {
            profile,
            factor_changes: changes,
        }
    }

    /// Scenario-specific commentary appended after the generic score statement.
    pub fn remark(&self, score_change: f64) -> &'static str {
        match self {
            Scenario::SalaryIncrease { .. } => {
                "Higher income typically improves creditworthiness and borrowing capacity"
            }
            Scenario::JobChange { .. } => {
                "Keep payments on schedule through a job change, since lenders weigh income \
                 stability"
            }
            Scenario::HousePurchase { .. } if score_change > 0.0 => {
                "Homeownership can improve credit scores through consistent mortgage payments"
            }
            Scenario::HousePurchase { .. } => {
                "Consider the impact of additional debt on your overall financial health"
            }
            Scenario::DebtReduction { .. } => {
                "Reducing debt improves your debt-to-income ratio and credit utilization"
            }
            Scenario::ExpenseReduction { .. } => {
                "Lower monthly expenses raise your income-to-expense ratio and leave more room \
                 for savings"
            }
        }
    }
}

/// Generic score statement; changes under half a point count as no change.
pub fn score_change_statement(score_change: f64) -> String {
    if score_change >= 0.5 {
        format!("This scenario would improve your credit score by {score_change:.0} points")
    } else if score_change <= -0.5 {
        format!(
            "This scenario would decrease your credit score by {:.0} points",
            score_change.abs()
        )
    } else {
        "This scenario would have minimal impact on your credit score".to_string()
    }
}
