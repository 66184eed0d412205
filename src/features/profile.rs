use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Self-reported attributes of one individual. Every field is optional on the wire; missing
/// fields take the defaults declared in [`Profile::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub savings_balance: f64,
    pub investment_balance: f64,
    pub credit_card_balance: f64,
    pub credit_card_limit: f64,
    pub loan_balance: f64,
    #[serde(deserialize_with = "whole_count")]
    pub late_payments: u32,
    #[serde(deserialize_with = "whole_count")]
    pub missed_payments: u32,
    pub years_experience: f64,
    pub salary: f64,
    pub job_stability_score: f64,
    pub job_title: String,
    pub industry: String,
    pub housing_status: HousingStatus,
    pub monthly_rent: f64,
    pub mortgage_payment: f64,
    pub property_value: f64,
    pub education_level: EducationLevel,
    #[serde(deserialize_with = "whole_count")]
    pub age: u32,
    pub social_score: f64,
}

/// Counts arrive from loosely typed clients as `2` or `2.0`; anything that is not a whole
/// number in `u32` range is rejected.
fn whole_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if raw.is_finite() && raw.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&raw) {
        Ok(raw as u32)
    } else {
        Err(D::Error::custom(format!("expected a whole non-negative count, got {raw}")))
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            monthly_income: 0.0,
            monthly_expenses: 0.0,
            savings_balance: 0.0,
            investment_balance: 0.0,
            credit_card_balance: 0.0,
            // a zero limit would make utilization meaningless
            credit_card_limit: 1.0,
            loan_balance: 0.0,
            late_payments: 0,
            missed_payments: 0,
            years_experience: 0.0,
            salary: 0.0,
            job_stability_score: 0.5,
            job_title: String::new(),
            industry: String::new(),
            housing_status: HousingStatus::Renting,
            monthly_rent: 0.0,
            mortgage_payment: 0.0,
            property_value: 0.0,
            education_level: EducationLevel::HighSchool,
            age: 30,
            social_score: 0.5,
        }
    }
}

/// Housing situation; unknown labels fall back to renting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum HousingStatus {
    #[default]
    Renting,
    Owned,
    Mortgaged,
}

impl HousingStatus {
    pub const fn code(self) -> u8 {
        match self {
            HousingStatus::Renting => 0,
            HousingStatus::Owned => 1,
            HousingStatus::Mortgaged => 2,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            HousingStatus::Renting => "renting",
            HousingStatus::Owned => "owned",
            HousingStatus::Mortgaged => "mortgaged",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "owned" => Self::Owned,
            "mortgaged" => Self::Mortgaged,
            _ => Self::Renting,
        }
    }
}

impl From<String> for HousingStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl fmt::Display for HousingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Highest completed education; unknown labels fall back to high school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum EducationLevel {
    #[default]
    HighSchool,
    Bachelors,
    Masters,
    Phd,
}

impl EducationLevel {
    pub const fn code(self) -> u8 {
        match self {
            EducationLevel::HighSchool => 0,
            EducationLevel::Bachelors => 1,
            EducationLevel::Masters => 2,
            EducationLevel::Phd => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            EducationLevel::HighSchool => "high_school",
            EducationLevel::Bachelors => "bachelors",
            EducationLevel::Masters => "masters",
            EducationLevel::Phd => "phd",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "bachelors" => Self::Bachelors,
            "masters" => Self::Masters,
            "phd" => Self::Phd,
            _ => Self::HighSchool,
        }
    }
}

impl From<String> for EducationLevel {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
