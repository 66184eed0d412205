//! Score predictor: feature scaler plus boosted-tree regressor, trained from synthetic data
//! when nothing usable is persisted.

mod boosting;
mod scaler;
mod store;
pub mod synthetic;

pub use boosting::{BoostingParams, GradientBoostedRegressor, MonotoneConstraint};
pub use scaler::FeatureScaler;
pub use store::{ModelStore, MODEL_FILE, SCALER_FILE};

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, OnceCell};
use tracing::{info, warn};

use crate::config::ModelConfig;
use crate::features::{column, to_feature_vector, FeatureVector, Profile, FEATURE_COUNT};
use synthetic::{generate_training_set, MAX_SCORE, MIN_SCORE};

pub const MODEL_VERSION: &str = "1.0.0";

/// Failures while generating data, training, or reading and writing persisted model state.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("degenerate training data ({rows} rows): {reason}")]
    DegenerateDataset { rows: usize, reason: String },
    #[error("invalid sampling distribution for {field}: {reason}")]
    InvalidDistribution { field: &'static str, reason: String },
    #[error("feature count mismatch (expected {expected}, found {found})")]
    FeatureMismatch { expected: usize, found: usize },
    #[error("persisted model is corrupt: {reason}")]
    Corrupt { reason: String },
    #[error("model store I/O failed at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model blob at {path:?} could not be (de)serialized: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("background model initialization failed: {0}")]
    Background(String),
}

/// Errors surfaced to scoring callers.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("credit model unavailable; initialize the model handle first")]
    ModelUnavailable,
    #[error("credit model is still initializing")]
    ModelNotReady,
    #[error("credit model could not be built: {0}")]
    Configuration(#[source] Arc<ModelError>),
}

impl From<ModelError> for ScoringError {
    fn from(err: ModelError) -> Self {
        ScoringError::Configuration(Arc::new(err))
    }
}

impl ScoringError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScoringError::ModelNotReady)
    }
}

/// How a replacement model is trained when none is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub rows: usize,
    pub seed: u64,
    pub test_fraction: f64,
    pub boosting: BoostingParams,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            rows: 10_000,
            seed: 42,
            test_fraction: 0.2,
            boosting: BoostingParams::default(),
        }
    }
}

/// Provenance stored next to the trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub version: String,
    pub trained_at: DateTime<Utc>,
    pub feature_count: usize,
    pub train_r2: f64,
    pub test_r2: f64,
    pub rows: usize,
    pub seed: u64,
}

/// Directions the score must move in as a single input grows, others held fixed.
pub fn credit_constraints() -> [MonotoneConstraint; FEATURE_COUNT] {
    let mut constraints = [MonotoneConstraint::Unconstrained; FEATURE_COUNT];
    for index in [
        column::MONTHLY_INCOME,
        column::SALARY,
        column::JOB_STABILITY,
        column::INCOME_EXPENSE_RATIO,
        column::SAVINGS_RATE,
    ] {
        constraints[index] = MonotoneConstraint::Increasing;
    }
    for index in [
        column::MONTHLY_EXPENSES,
        column::LATE_PAYMENTS,
        column::MISSED_PAYMENTS,
        column::CREDIT_UTILIZATION,
        column::DEBT_TO_INCOME,
    ] {
        constraints[index] = MonotoneConstraint::Decreasing;
    }
    constraints
}

/// Trained, read-only scoring model. Shared behind an [`Arc`] once built.
#[derive(Debug, Clone)]
pub struct ScorePredictor {
    scaler: FeatureScaler,
    regressor: GradientBoostedRegressor,
    metadata: ModelMetadata,
}

impl ScorePredictor {
    pub fn train(config: &TrainingConfig) -> Result<Self, ModelError> {
        if config.rows < 2 {
            return Err(ModelError::DegenerateDataset {
                rows: config.rows,
                reason: "need at least one training and one test row".to_string(),
            });
        }
        info!(rows = config.rows, seed = config.seed, "training credit model");

        let data = generate_training_set(config.rows, config.seed)?;

        let mut order: Vec<usize> = (0..data.len()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(config.seed));
        let test_fraction = config.test_fraction.clamp(0.0, 1.0);
        let test_len = ((data.len() as f64) * test_fraction).round() as usize;
        let test_len = test_len.clamp(1, data.len() - 1);
        let (test_idx, train_idx) = order.split_at(test_len);

        let pick = |indices: &[usize]| -> (Vec<FeatureVector>, Vec<f64>) {
            indices
                .iter()
                .map(|&i| (data.features[i], data.targets[i]))
                .unzip()
        };
        let (train_x, train_y) = pick(train_idx);
        let (test_x, test_y) = pick(test_idx);

        let scaler = FeatureScaler::fit(&train_x)?;
        let scaled_train: Vec<FeatureVector> =
            train_x.iter().map(|row| scaler.transform(row)).collect();
        let regressor = GradientBoostedRegressor::fit(
            &scaled_train,
            &train_y,
            &config.boosting,
            &credit_constraints(),
        )?;

        let score = |rows: &[FeatureVector]| -> Vec<f64> {
            rows.iter()
                .map(|row| regressor.predict(&scaler.transform(row)))
                .collect()
        };
        let train_r2 = r_squared(&train_y, &score(&train_x));
        let test_r2 = r_squared(&test_y, &score(&test_x));
        info!(
            train_r2,
            test_r2,
            trees = regressor.tree_count(),
            "credit model trained"
        );

        Ok(Self {
            scaler,
            regressor,
            metadata: ModelMetadata {
                version: MODEL_VERSION.to_string(),
                trained_at: Utc::now(),
                feature_count: FEATURE_COUNT,
                train_r2,
                test_r2,
                rows: config.rows,
                seed: config.seed,
            },
        })
    }

    /// Raw score in [300, 850].
    pub fn predict(&self, profile: &Profile) -> f64 {
        self.predict_vector(&to_feature_vector(profile))
    }

    pub fn predict_vector(&self, features: &FeatureVector) -> f64 {
        let raw = self.regressor.predict(&self.scaler.transform(features));
        if raw.is_nan() {
            return MIN_SCORE;
        }
        raw.clamp(MIN_SCORE, MAX_SCORE)
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn validate(&self) -> Result<(), ModelError> {
        self.scaler.validate()?;
        self.regressor.validate()
    }
}

/// Coefficient of determination; 0 when the targets have no variance.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let total: f64 = actual.iter().map(|value| (value - mean).powi(2)).sum();
    if total <= f64::EPSILON {
        return 0.0;
    }
    let residual: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(value, prediction)| (value - prediction).powi(2))
        .sum();
    1.0 - residual / total
}

/// Loads the persisted model, or trains and persists a fresh one.
pub fn load_or_train(config: &ModelConfig) -> Result<ScorePredictor, ModelError> {
    let store = ModelStore::new(&config.models_dir);

    match store.load() {
        Ok(Some(predictor)) => {
            info!(
                dir = %store.dir().display(),
                version = predictor.version(),
                trained_at = %predictor.metadata().trained_at,
                "credit model loaded from store"
            );
            return Ok(predictor);
        }
        Ok(None) => info!(dir = %store.dir().display(), "no persisted credit model"),
        Err(err) => warn!(
            dir = %store.dir().display(),
            error = %err,
            "persisted credit model unusable, retraining"
        ),
    }

    let predictor = ScorePredictor::train(&config.training)?;
    if let Err(err) = store.save(&predictor) {
        warn!(error = %err, "failed to persist credit model; continuing with in-memory copy");
    }
    Ok(predictor)
}

/// Outcome broadcast by the initialization task; `None` while it is still running.
type InitOutcome = Option<Result<(), Arc<ModelError>>>;

/// Injectable owner of the process-wide model. Load-or-train runs at most once, on a task
/// owned by the handle rather than by any caller, so a caller that is cancelled or times out
/// leaves the model initializing. Afterwards every caller shares the same read-only predictor.
#[derive(Debug)]
pub struct ModelHandle {
    cell: Arc<OnceCell<Arc<ScorePredictor>>>,
    initializing: Arc<AtomicBool>,
    in_flight: Arc<Mutex<Option<watch::Receiver<InitOutcome>>>>,
    config: ModelConfig,
}

fn lock_slot<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

// Held by the initialization task. Dropping it, on completion or if the task is torn down,
// frees the in-flight slot so a failed attempt can be retried.
struct InFlightGuard {
    initializing: Arc<AtomicBool>,
    in_flight: Arc<Mutex<Option<watch::Receiver<InitOutcome>>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut slot = lock_slot(&self.in_flight);
        *slot = None;
        self.initializing.store(false, Ordering::SeqCst);
    }
}

impl ModelHandle {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
            initializing: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(Mutex::new(None)),
            config,
        }
    }

    /// Wraps a predictor that is already built; `initialize` becomes a no-op.
    pub fn ready(predictor: ScorePredictor) -> Self {
        Self {
            cell: Arc::new(OnceCell::new_with(Some(Arc::new(predictor)))),
            initializing: Arc::new(AtomicBool::new(false)),
            in_flight: Arc::new(Mutex::new(None)),
            config: ModelConfig::default(),
        }
    }

    /// Joins the running initialization or starts one. Concurrent callers await the same
    /// attempt; a failed attempt leaves the handle uninitialized so a later call may retry.
    pub async fn initialize(&self) -> Result<Arc<ScorePredictor>, ScoringError> {
        let Some(mut outcome) = self.join_or_start() else {
            return self.predictor();
        };

        let finished = outcome
            .wait_for(Option::is_some)
            .await
            .map(|state| (*state).clone());
        match finished {
            Ok(Some(Ok(()))) => self.predictor(),
            Ok(Some(Err(err))) => Err(ScoringError::Configuration(err)),
            Ok(None) | Err(_) => Err(ModelError::Background(
                "model initialization task stopped before reporting".to_string(),
            )
            .into()),
        }
    }

    // `None` once the model is ready. The cell is re-checked under the slot lock because the
    // task fills the cell before it frees the slot.
    fn join_or_start(&self) -> Option<watch::Receiver<InitOutcome>> {
        let mut slot = lock_slot(&self.in_flight);
        if self.cell.initialized() {
            return None;
        }
        if let Some(receiver) = slot.as_ref() {
            return Some(receiver.clone());
        }

        let (sender, receiver) = watch::channel(None);
        *slot = Some(receiver.clone());
        self.initializing.store(true, Ordering::SeqCst);

        let guard = InFlightGuard {
            initializing: Arc::clone(&self.initializing),
            in_flight: Arc::clone(&self.in_flight),
        };
        let cell = Arc::clone(&self.cell);
        let config = self.config.clone();
        tokio::spawn(async move {
            let built = tokio::task::spawn_blocking(move || load_or_train(&config)).await;
            let outcome = match built {
                Ok(Ok(predictor)) => {
                    // only this task ever sets the cell
                    let _ = cell.set(Arc::new(predictor));
                    Ok(())
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "credit model initialization failed");
                    Err(Arc::new(err))
                }
                Err(err) => Err(Arc::new(ModelError::Background(err.to_string()))),
            };
            drop(guard);
            sender.send_replace(Some(outcome));
        });

        Some(receiver)
    }

    /// `ModelNotReady` while initialization runs, `ModelUnavailable` before it starts or after
    /// it failed.
    pub fn predictor(&self) -> Result<Arc<ScorePredictor>, ScoringError> {
        if let Some(predictor) = self.cell.get() {
            return Ok(Arc::clone(predictor));
        }
        if self.initializing.load(Ordering::SeqCst) {
            Err(ScoringError::ModelNotReady)
        } else {
            Err(ScoringError::ModelUnavailable)
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::OnceLock;
    use std::time::Duration;

    fn small_config() -> TrainingConfig {
        TrainingConfig {
            rows: 600,
            seed: 42,
            boosting: BoostingParams {
                rounds: 25,
                max_depth: 4,
                ..BoostingParams::default()
            },
            ..TrainingConfig::default()
        }
    }

    fn shared_predictor() -> &'static ScorePredictor {
        static PREDICTOR: OnceLock<ScorePredictor> = OnceLock::new();
        PREDICTOR.get_or_init(|| {
            ScorePredictor::train(&small_config()).expect("small model trains")
        })
    }

    fn sample_profile() -> Profile {
        Profile {
            monthly_income: 6250.0,
            monthly_expenses: 3800.0,
            savings_balance: 15_000.0,
            credit_card_balance: 2500.0,
            credit_card_limit: 10_000.0,
            late_payments: 1,
            years_experience: 8.0,
            salary: 75_000.0,
            job_stability_score: 0.8,
            age: 32,
            social_score: 0.7,
            ..Profile::default()
        }
    }

    #[test]
    fn trained_model_scores_within_range() {
        let predictor = shared_predictor();
        assert_eq!(predictor.version(), MODEL_VERSION);
        assert_eq!(predictor.metadata().feature_count, FEATURE_COUNT);
        assert!(predictor.metadata().train_r2 > 0.5);

        for profile in [Profile::default(), sample_profile()] {
            let score = predictor.predict(&profile);
            assert!((MIN_SCORE..=MAX_SCORE).contains(&score));
        }
    }

    #[test]
    fn training_is_reproducible_for_a_seed() {
        let again = ScorePredictor::train(&small_config()).expect("trains");
        let profile = sample_profile();
        assert_eq!(shared_predictor().predict(&profile), again.predict(&profile));
    }

    #[test]
    fn higher_salary_never_lowers_the_score() {
        let predictor = shared_predictor();
        let baseline = sample_profile();
        let mut raised = baseline.clone();
        raised.salary += 10_000.0;
        raised.monthly_income += 10_000.0 / 12.0;
        assert!(predictor.predict(&raised) >= predictor.predict(&baseline));
    }

    #[test]
    fn rejects_single_row_training() {
        let config = TrainingConfig {
            rows: 1,
            ..small_config()
        };
        assert!(matches!(
            ScorePredictor::train(&config),
            Err(ModelError::DegenerateDataset { rows: 1, .. })
        ));
    }

    #[test]
    fn r_squared_handles_perfect_and_flat_fits() {
        assert_eq!(r_squared(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0);
        assert_eq!(r_squared(&[5.0, 5.0], &[4.0, 6.0]), 0.0);
    }

    #[test]
    fn uninitialized_handle_reports_unavailable() {
        let handle = ModelHandle::new(ModelConfig::default());
        assert!(!handle.is_ready());
        assert!(matches!(
            handle.predictor(),
            Err(ScoringError::ModelUnavailable)
        ));
        assert!(!ScoringError::ModelUnavailable.is_retryable());
        assert!(ScoringError::ModelNotReady.is_retryable());
    }

    #[tokio::test]
    async fn ready_handle_skips_initialization() {
        let handle = ModelHandle::ready(shared_predictor().clone());
        assert!(handle.is_ready());
        let first = handle.predictor().expect("ready");
        let second = handle.initialize().await.expect("already initialized");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn initialize_trains_and_persists_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let handle = Arc::new(ModelHandle::new(ModelConfig {
            models_dir: dir.path().to_path_buf(),
            training: TrainingConfig {
                rows: 200,
                boosting: BoostingParams {
                    rounds: 5,
                    max_depth: 3,
                    ..BoostingParams::default()
                },
                ..TrainingConfig::default()
            },
        }));

        let (first, second) = tokio::join!(handle.initialize(), handle.initialize());
        let first = first.expect("initializes");
        let second = second.expect("initializes");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(dir.path().join(SCALER_FILE).exists());
        assert!(dir.path().join(MODEL_FILE).exists());
        assert!(Arc::ptr_eq(&first, &handle.predictor().expect("ready")));
    }

    // Full-size training, so initialization is still running when the test looks at it.
    fn slow_config(dir: &Path) -> ModelConfig {
        ModelConfig {
            models_dir: dir.to_path_buf(),
            training: TrainingConfig {
                rows: 8000,
                ..TrainingConfig::default()
            },
        }
    }

    async fn until_initializing(handle: &ModelHandle) {
        loop {
            match handle.predictor() {
                Err(ScoringError::ModelNotReady) => return,
                Err(ScoringError::ModelUnavailable) => tokio::task::yield_now().await,
                other => panic!("initialization finished before it was observed: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn reports_not_ready_while_training() {
        let dir = tempfile::tempdir().expect("tempdir");
        let handle = Arc::new(ModelHandle::new(slow_config(dir.path())));

        let waiter = tokio::spawn({
            let handle = Arc::clone(&handle);
            async move { handle.initialize().await }
        });
        until_initializing(&handle).await;

        let err = handle.predictor().expect_err("still training");
        assert!(err.is_retryable());
        assert!(!handle.is_ready());

        let predictor = waiter.await.expect("task joins").expect("initializes");
        assert!(handle.is_ready());
        assert!(Arc::ptr_eq(&predictor, &handle.predictor().expect("ready")));
    }

    #[tokio::test]
    async fn cancelled_caller_leaves_initialization_running() {
        let dir = tempfile::tempdir().expect("tempdir");
        let handle = Arc::new(ModelHandle::new(slow_config(dir.path())));

        let waiter = tokio::spawn({
            let handle = Arc::clone(&handle);
            async move { handle.initialize().await }
        });
        until_initializing(&handle).await;
        waiter.abort();
        assert!(waiter.await.expect_err("caller aborted").is_cancelled());
        assert!(matches!(
            handle.predictor(),
            Err(ScoringError::ModelNotReady)
        ));

        // nobody calls initialize again; the original attempt has to finish by itself
        tokio::time::timeout(Duration::from_secs(300), async {
            while !handle.is_ready() {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("abandoned initialization completes");

        let trained = handle.predictor().expect("ready");
        let again = handle.initialize().await.expect("already initialized");
        assert!(Arc::ptr_eq(&trained, &again));
    }

    #[tokio::test]
    async fn failed_initialization_can_be_retried() {
        let dir = tempfile::tempdir().expect("tempdir");
        let handle = ModelHandle::new(ModelConfig {
            models_dir: dir.path().to_path_buf(),
            training: TrainingConfig {
                rows: 1,
                ..small_config()
            },
        });

        let err = handle.initialize().await.expect_err("one row cannot train");
        assert!(matches!(
            err,
            ScoringError::Configuration(ref source)
                if matches!(**source, ModelError::DegenerateDataset { rows: 1, .. })
        ));
        assert!(matches!(
            handle.predictor(),
            Err(ScoringError::ModelUnavailable)
        ));

        let again = handle.initialize().await.expect_err("still one row");
        assert!(matches!(again, ScoringError::Configuration(_)));
    }
}
