use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::features::{FeatureVector, FEATURE_COUNT};

/// Per-column standardization fitted on the training split: `(x - mean) / scale`.
///
/// Columns with zero variance keep a scale of 1 so constant inputs map to 0 instead of NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl FeatureScaler {
    pub fn fit(rows: &[FeatureVector]) -> Result<Self, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::DegenerateDataset {
                rows: 0,
                reason: "cannot fit scaler without rows".to_string(),
            });
        }

        let count = rows.len() as f64;
        let mut mean = vec![0.0; FEATURE_COUNT];
        for row in rows {
            for (acc, value) in mean.iter_mut().zip(row.as_slice()) {
                *acc += value;
            }
        }
        for acc in &mut mean {
            *acc /= count;
        }

        let mut variance = vec![0.0; FEATURE_COUNT];
        for row in rows {
            for ((acc, value), centre) in variance.iter_mut().zip(row.as_slice()).zip(&mean) {
                *acc += (value - centre).powi(2);
            }
        }

        let scale = variance
            .into_iter()
            .map(|sum| {
                let std_dev = (sum / count).sqrt();
                if std_dev.is_finite() && std_dev > f64::EPSILON {
                    std_dev
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn transform(&self, row: &FeatureVector) -> FeatureVector {
        let mut scaled = [0.0; FEATURE_COUNT];
        for (index, value) in row.as_slice().iter().enumerate() {
            scaled[index] = (value - self.mean[index]) / self.scale[index];
        }
        FeatureVector(scaled)
    }

    /// Confirms a deserialized scaler matches the current feature layout.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.mean.len() != FEATURE_COUNT || self.scale.len() != FEATURE_COUNT {
            return Err(ModelError::FeatureMismatch {
                expected: FEATURE_COUNT,
                found: self.mean.len().min(self.scale.len()),
            });
        }
        if self.scale.iter().any(|scale| !scale.is_finite() || *scale <= 0.0) {
            return Err(ModelError::Corrupt {
                reason: "scaler contains a non-positive scale".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(fill: f64, first: f64) -> FeatureVector {
        let mut values = [fill; FEATURE_COUNT];
        values[0] = first;
        FeatureVector(values)
    }

    #[test]
    fn standardizes_columns() {
        let rows = vec![vector(5.0, 1.0), vector(5.0, 3.0)];
        let scaler = FeatureScaler::fit(&rows).expect("fits");

        let scaled = scaler.transform(&rows[0]);
        assert!((scaled.0[0] + 1.0).abs() < 1e-12);
        // constant column: mean removed, unit scale kept
        assert_eq!(scaled.0[1], 0.0);

        let scaled = scaler.transform(&vector(6.0, 3.0));
        assert!((scaled.0[0] - 1.0).abs() < 1e-12);
        assert_eq!(scaled.0[1], 1.0);
    }

    #[test]
    fn rejects_wrong_width_on_validate() {
        let scaler = FeatureScaler {
            mean: vec![0.0; 3],
            scale: vec![1.0; 3],
        };
        assert!(matches!(
            scaler.validate(),
            Err(ModelError::FeatureMismatch {
                expected: FEATURE_COUNT,
                found: 3
            })
        ));
    }
}
