//! Feature pipeline shared by training and inference.
//!
//! Both the synthetic generator and the scorer go through [`RawFeatures::encode`], so the
//! column order and the derived ratios cannot drift between the two paths.

mod profile;

pub use profile::{EducationLevel, HousingStatus, Profile};

use serde::{Deserialize, Serialize};

/// Number of model inputs: 18 raw fields plus 4 derived ratios.
pub const FEATURE_COUNT: usize = 22;

/// Column names in model order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "monthly_income",
    "monthly_expenses",
    "savings_balance",
    "credit_card_balance",
    "credit_card_limit",
    "loan_balance",
    "late_payments",
    "missed_payments",
    "years_experience",
    "salary",
    "job_stability_score",
    "housing_status",
    "monthly_rent",
    "mortgage_payment",
    "property_value",
    "education_level",
    "age",
    "social_score",
    "income_expense_ratio",
    "credit_utilization",
    "savings_rate",
    "debt_to_income",
];

/// Column indices the model and its monotone constraints refer to.
pub mod column {
    pub const MONTHLY_INCOME: usize = 0;
    pub const MONTHLY_EXPENSES: usize = 1;
    pub const LATE_PAYMENTS: usize = 6;
    pub const MISSED_PAYMENTS: usize = 7;
    pub const SALARY: usize = 9;
    pub const JOB_STABILITY: usize = 10;
    pub const INCOME_EXPENSE_RATIO: usize = 18;
    pub const CREDIT_UTILIZATION: usize = 19;
    pub const SAVINGS_RATE: usize = 20;
    pub const DEBT_TO_INCOME: usize = 21;
}

/// Fixed-order numeric encoding of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }
}

/// The four ratios derived from raw amounts. The `+ 1` denominators keep every ratio finite
/// for non-negative inputs and must stay exactly as they are for score reproducibility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedRatios {
    pub income_expense_ratio: f64,
    pub credit_utilization: f64,
    pub savings_rate: f64,
    pub debt_to_income: f64,
}

impl DerivedRatios {
    pub fn compute(
        monthly_income: f64,
        monthly_expenses: f64,
        credit_card_balance: f64,
        credit_card_limit: f64,
        loan_balance: f64,
    ) -> Self {
        Self {
            income_expense_ratio: monthly_income / (monthly_expenses + 1.0),
            credit_utilization: credit_card_balance / (credit_card_limit + 1.0),
            savings_rate: (monthly_income - monthly_expenses) / (monthly_income + 1.0),
            debt_to_income: (credit_card_balance + loan_balance) / (monthly_income * 12.0 + 1.0),
        }
    }

    pub fn for_profile(profile: &Profile) -> Self {
        Self::compute(
            profile.monthly_income,
            profile.monthly_expenses,
            profile.credit_card_balance,
            profile.credit_card_limit,
            profile.loan_balance,
        )
    }
}

/// Raw model inputs before the derived ratios are appended. Counts and category codes are
/// already floats here because the synthetic generator draws them that way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFeatures {
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub savings_balance: f64,
    pub credit_card_balance: f64,
    pub credit_card_limit: f64,
    pub loan_balance: f64,
    pub late_payments: f64,
    pub missed_payments: f64,
    pub years_experience: f64,
    pub salary: f64,
    pub job_stability_score: f64,
    pub housing_code: f64,
    pub monthly_rent: f64,
    pub mortgage_payment: f64,
    pub property_value: f64,
    pub education_code: f64,
    pub age: f64,
    pub social_score: f64,
}

impl RawFeatures {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            monthly_income: profile.monthly_income,
            monthly_expenses: profile.monthly_expenses,
            savings_balance: profile.savings_balance,
            credit_card_balance: profile.credit_card_balance,
            credit_card_limit: profile.credit_card_limit,
            loan_balance: profile.loan_balance,
            late_payments: f64::from(profile.late_payments),
            missed_payments: f64::from(profile.missed_payments),
            years_experience: profile.years_experience,
            salary: profile.salary,
            job_stability_score: profile.job_stability_score,
            housing_code: f64::from(profile.housing_status.code()),
            monthly_rent: profile.monthly_rent,
            mortgage_payment: profile.mortgage_payment,
            property_value: profile.property_value,
            education_code: f64::from(profile.education_level.code()),
            age: f64::from(profile.age),
            social_score: profile.social_score,
        }
    }

    pub fn ratios(&self) -> DerivedRatios {
        DerivedRatios::compute(
            self.monthly_income,
            self.monthly_expenses,
            self.credit_card_balance,
            self.credit_card_limit,
            self.loan_balance,
        )
    }

    pub fn encode(&self) -> FeatureVector {
        let ratios = self.ratios();
        FeatureVector([
            self.monthly_income,
            self.monthly_expenses,
            self.savings_balance,
            self.credit_card_balance,
            self.credit_card_limit,
            self.loan_balance,
            self.late_payments,
            self.missed_payments,
            self.years_experience,
            self.salary,
            self.job_stability_score,
            self.housing_code,
            self.monthly_rent,
            self.mortgage_payment,
            self.property_value,
            self.education_code,
            self.age,
            self.social_score,
            ratios.income_expense_ratio,
            ratios.credit_utilization,
            ratios.savings_rate,
            ratios.debt_to_income,
        ])
    }
}

/// Encodes a profile for model inference. Total: every field already carries its default.
pub fn to_feature_vector(profile: &Profile) -> FeatureVector {
    RawFeatures::from_profile(profile).encode()
}
