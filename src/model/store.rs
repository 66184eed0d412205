use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GradientBoostedRegressor, ModelError, ModelMetadata, ScorePredictor};
use crate::features::FEATURE_COUNT;
use crate::model::FeatureScaler;

pub const SCALER_FILE: &str = "scaler.json";
pub const MODEL_FILE: &str = "credit_model.json";

#[derive(Serialize)]
struct ModelBlobRef<'a> {
    metadata: &'a ModelMetadata,
    regressor: &'a GradientBoostedRegressor,
}

#[derive(Deserialize)]
struct ModelBlob {
    metadata: ModelMetadata,
    regressor: GradientBoostedRegressor,
}

/// Directory holding the two persisted blobs: the fitted scaler and the tree ensemble.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join(SCALER_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    /// `Ok(None)` when either blob is missing; an error when a blob exists but cannot be used.
    pub fn load(&self) -> Result<Option<ScorePredictor>, ModelError> {
        let Some(scaler_bytes) = read_optional(&self.scaler_path())? else {
            return Ok(None);
        };
        let Some(model_bytes) = read_optional(&self.model_path())? else {
            return Ok(None);
        };

        let scaler: FeatureScaler =
            serde_json::from_slice(&scaler_bytes).map_err(|source| ModelError::Serialization {
                path: self.scaler_path(),
                source,
            })?;
        let blob: ModelBlob =
            serde_json::from_slice(&model_bytes).map_err(|source| ModelError::Serialization {
                path: self.model_path(),
                source,
            })?;

        if blob.metadata.feature_count != FEATURE_COUNT {
            return Err(ModelError::FeatureMismatch {
                expected: FEATURE_COUNT,
                found: blob.metadata.feature_count,
            });
        }

        let predictor = ScorePredictor {
            scaler,
            regressor: blob.regressor,
            metadata: blob.metadata,
        };
        predictor.validate()?;
        Ok(Some(predictor))
    }

    pub fn save(&self, predictor: &ScorePredictor) -> Result<(), ModelError> {
        fs::create_dir_all(&self.dir).map_err(|source| ModelError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let scaler_json = serde_json::to_vec_pretty(&predictor.scaler).map_err(|source| {
            ModelError::Serialization {
                path: self.scaler_path(),
                source,
            }
        })?;
        let model_json = serde_json::to_vec(&ModelBlobRef {
            metadata: &predictor.metadata,
            regressor: &predictor.regressor,
        })
        .map_err(|source| ModelError::Serialization {
            path: self.model_path(),
            source,
        })?;

        write_replacing(&self.scaler_path(), &scaler_json)?;
        write_replacing(&self.model_path(), &model_json)?;
        debug!(dir = %self.dir.display(), "credit model persisted");
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, ModelError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ModelError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// Readers never observe a half-written blob: write beside the target, then rename over it.
fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), ModelError> {
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, bytes).map_err(|source| ModelError::Io {
        path: staging.clone(),
        source,
    })?;
    fs::rename(&staging, path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })
}
