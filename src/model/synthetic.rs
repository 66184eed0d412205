//! Synthetic training data used to bootstrap the regressor when nothing is persisted.

use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Beta, Distribution, Exp, Normal, Poisson};

use super::ModelError;
use crate::features::{FeatureVector, RawFeatures};

pub const MIN_SCORE: f64 = 300.0;
pub const MAX_SCORE: f64 = 850.0;

const NOISE_STD_DEV: f64 = 30.0;

/// Feature matrix and synthesized target scores.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub features: Vec<FeatureVector>,
    pub targets: Vec<f64>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

struct FieldDistributions {
    monthly_income: Normal<f64>,
    monthly_expenses: Normal<f64>,
    savings_balance: Exp<f64>,
    credit_card_balance: Exp<f64>,
    credit_card_limit: Normal<f64>,
    loan_balance: Exp<f64>,
    late_payments: Poisson<f64>,
    missed_payments: Poisson<f64>,
    years_experience: Exp<f64>,
    salary: Normal<f64>,
    job_stability_score: Beta<f64>,
    housing_code: WeightedIndex<f64>,
    monthly_rent: Normal<f64>,
    mortgage_payment: Normal<f64>,
    property_value: Exp<f64>,
    education_code: WeightedIndex<f64>,
    age: Normal<f64>,
    social_score: Beta<f64>,
    noise: Normal<f64>,
}

fn invalid(field: &'static str) -> impl Fn(String) -> ModelError {
    move |reason| ModelError::InvalidDistribution { field, reason }
}

fn normal(field: &'static str, mean: f64, std_dev: f64) -> Result<Normal<f64>, ModelError> {
    Normal::new(mean, std_dev).map_err(|err| invalid(field)(err.to_string()))
}

fn exponential(field: &'static str, mean: f64) -> Result<Exp<f64>, ModelError> {
    Exp::new(1.0 / mean).map_err(|err| invalid(field)(err.to_string()))
}

fn poisson(field: &'static str, rate: f64) -> Result<Poisson<f64>, ModelError> {
    Poisson::new(rate).map_err(|err| invalid(field)(err.to_string()))
}

fn beta(field: &'static str, alpha: f64, beta: f64) -> Result<Beta<f64>, ModelError> {
    Beta::new(alpha, beta).map_err(|err| invalid(field)(err.to_string()))
}

fn categorical(field: &'static str, weights: &[f64]) -> Result<WeightedIndex<f64>, ModelError> {
    WeightedIndex::new(weights).map_err(|err| invalid(field)(err.to_string()))
}

impl FieldDistributions {
    fn new() -> Result<Self, ModelError> {
        Ok(Self {
            monthly_income: normal("monthly_income", 5000.0, 2000.0)?,
            monthly_expenses: normal("monthly_expenses", 3000.0, 1000.0)?,
            savings_balance: exponential("savings_balance", 10_000.0)?,
            credit_card_balance: exponential("credit_card_balance", 2000.0)?,
            credit_card_limit: normal("credit_card_limit", 8000.0, 3000.0)?,
            loan_balance: exponential("loan_balance", 15_000.0)?,
            late_payments: poisson("late_payments", 1.0)?,
            missed_payments: poisson("missed_payments", 0.5)?,
            years_experience: exponential("years_experience", 5.0)?,
            salary: normal("salary", 60_000.0, 25_000.0)?,
            job_stability_score: beta("job_stability_score", 2.0, 2.0)?,
            housing_code: categorical("housing_status", &[0.4, 0.3, 0.3])?,
            monthly_rent: normal("monthly_rent", 1500.0, 500.0)?,
            mortgage_payment: normal("mortgage_payment", 2000.0, 800.0)?,
            property_value: exponential("property_value", 300_000.0)?,
            education_code: categorical("education_level", &[0.2, 0.3, 0.3, 0.2])?,
            age: normal("age", 35.0, 10.0)?,
            social_score: beta("social_score", 3.0, 2.0)?,
            noise: normal("noise", 0.0, NOISE_STD_DEV)?,
        })
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> RawFeatures {
        RawFeatures {
            monthly_income: self.monthly_income.sample(rng),
            monthly_expenses: self.monthly_expenses.sample(rng),
            savings_balance: self.savings_balance.sample(rng),
            credit_card_balance: self.credit_card_balance.sample(rng),
            credit_card_limit: self.credit_card_limit.sample(rng),
            loan_balance: self.loan_balance.sample(rng),
            late_payments: self.late_payments.sample(rng),
            missed_payments: self.missed_payments.sample(rng),
            years_experience: self.years_experience.sample(rng),
            salary: self.salary.sample(rng),
            job_stability_score: self.job_stability_score.sample(rng),
            housing_code: self.housing_code.sample(rng) as f64,
            monthly_rent: self.monthly_rent.sample(rng),
            mortgage_payment: self.mortgage_payment.sample(rng),
            property_value: self.property_value.sample(rng),
            education_code: self.education_code.sample(rng) as f64,
            age: self.age.sample(rng),
            social_score: self.social_score.sample(rng),
        }
    }
}

/// Closed-form score the regressor learns to approximate, before noise and clamping.
pub fn target_score(raw: &RawFeatures) -> f64 {
    let ratios = raw.ratios();

    let base = MIN_SCORE + ratios.income_expense_ratio * 100.0 + ratios.savings_rate * 200.0;
    let credit = -raw.late_payments * 20.0 - raw.missed_payments * 30.0
        + (1.0 - ratios.credit_utilization) * 100.0;
    let career = raw.job_stability_score * 100.0 + raw.years_experience * 5.0;
    let housing = raw.housing_code * 50.0;
    let education = raw.education_code * 30.0;
    let age = (raw.age - 25.0).clamp(0.0, 30.0) * 2.0;

    base + credit + career + housing + education + age
}

/// Draws `rows` synthetic profiles and their target scores. The same seed always yields the
/// same dataset.
pub fn generate_training_set(rows: usize, seed: u64) -> Result<TrainingSet, ModelError> {
    if rows == 0 {
        return Err(ModelError::DegenerateDataset {
            rows,
            reason: "no rows requested".to_string(),
        });
    }

    let distributions = FieldDistributions::new()?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut features = Vec::with_capacity(rows);
    let mut targets = Vec::with_capacity(rows);

    for _ in 0..rows {
        let raw = distributions.draw(&mut rng);
        let noisy = target_score(&raw) + distributions.noise.sample(&mut rng);
        features.push(raw.encode());
        targets.push(noisy.clamp(MIN_SCORE, MAX_SCORE));
    }

    Ok(TrainingSet { features, targets })
}
