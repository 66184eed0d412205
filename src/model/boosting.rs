//! Gradient-boosted regression trees with a squared-error objective.
//!
//! Split search is histogram based: every column is bucketed once into at most
//! `max_bins` quantile bins, so each tree level costs one pass over the rows per column.
//! Leaf weights follow the second-order rule `-G / (H + lambda)`, and columns can carry a
//! monotone constraint that bounds leaf weights the same way XGBoost does.

use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::features::{FeatureVector, FEATURE_COUNT};

/// Hyper-parameters for [`GradientBoostedRegressor::fit`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub rounds: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub lambda: f64,
    pub min_child_weight: f64,
    pub max_bins: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            rounds: 100,
            max_depth: 6,
            learning_rate: 0.1,
            lambda: 1.0,
            min_child_weight: 1.0,
            max_bins: 64,
        }
    }
}

/// Required direction of the model output as one column grows, others held fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonotoneConstraint {
    #[default]
    Unconstrained,
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// One fitted tree; node 0 is the root and children always follow their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn predict(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value }) => return *value,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(f64::NAN);
                    index = if value <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(corrupt("tree without nodes"));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { value } if !value.is_finite() => {
                    return Err(corrupt("non-finite leaf value"));
                }
                TreeNode::Leaf { .. } => {}
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(ModelError::FeatureMismatch {
                            expected: FEATURE_COUNT,
                            found: feature + 1,
                        });
                    }
                    if threshold.is_nan() {
                        return Err(corrupt("NaN split threshold"));
                    }
                    let in_range = |child: usize| child > index && child < self.nodes.len();
                    if !in_range(*left) || !in_range(*right) {
                        return Err(corrupt("split child index out of order"));
                    }
                }
            }
        }
        Ok(())
    }
}

fn corrupt(reason: &str) -> ModelError {
    ModelError::Corrupt {
        reason: reason.to_string(),
    }
}

/// Additive tree ensemble: `base_score + sum(tree(x))`, with shrinkage folded into leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedRegressor {
    base_score: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostedRegressor {
    pub fn fit(
        rows: &[FeatureVector],
        targets: &[f64],
        params: &BoostingParams,
        constraints: &[MonotoneConstraint; FEATURE_COUNT],
    ) -> Result<Self, ModelError> {
        if rows.is_empty() || rows.len() != targets.len() {
            return Err(ModelError::DegenerateDataset {
                rows: rows.len(),
                reason: format!("{} rows but {} targets", rows.len(), targets.len()),
            });
        }
        if targets.iter().any(|target| !target.is_finite()) {
            return Err(ModelError::DegenerateDataset {
                rows: rows.len(),
                reason: "non-finite target".to_string(),
            });
        }

        let binned = BinnedMatrix::build(rows, params.max_bins.max(2));
        let base_score = targets.iter().sum::<f64>() / targets.len() as f64;
        let mut predictions = vec![base_score; rows.len()];
        let hessians = vec![1.0; rows.len()];
        let mut trees = Vec::with_capacity(params.rounds);

        for _ in 0..params.rounds {
            let gradients: Vec<f64> = predictions
                .iter()
                .zip(targets)
                .map(|(prediction, target)| prediction - target)
                .collect();

            let mut builder = TreeBuilder {
                binned: &binned,
                gradients: &gradients,
                hessians: &hessians,
                params,
                constraints,
                nodes: Vec::new(),
            };
            builder.grow((0..rows.len()).collect(), 0, f64::NEG_INFINITY, f64::INFINITY);
            let tree = RegressionTree {
                nodes: builder.nodes,
            };

            for (prediction, row) in predictions.iter_mut().zip(rows) {
                *prediction += tree.predict(row.as_slice());
            }
            trees.push(tree);
        }

        Ok(Self { base_score, trees })
    }

    pub fn predict(&self, row: &FeatureVector) -> f64 {
        let values = row.as_slice();
        self.base_score + self.trees.iter().map(|tree| tree.predict(values)).sum::<f64>()
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Structural checks for an ensemble read back from storage.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.base_score.is_finite() {
            return Err(corrupt("non-finite base score"));
        }
        self.trees.iter().try_for_each(RegressionTree::validate)
    }
}

/// Column-major bin indices plus the cut points that produced them.
struct BinnedMatrix {
    cuts: Vec<Vec<f64>>,
    bins: Vec<Vec<u16>>,
}

impl BinnedMatrix {
    fn build(rows: &[FeatureVector], max_bins: usize) -> Self {
        let mut cuts = Vec::with_capacity(FEATURE_COUNT);
        let mut bins = Vec::with_capacity(FEATURE_COUNT);

        for feature in 0..FEATURE_COUNT {
            let column: Vec<f64> = rows.iter().map(|row| row.0[feature]).collect();
            let feature_cuts = quantile_cuts(&column, max_bins);
            let feature_bins = column
                .iter()
                .map(|value| feature_cuts.partition_point(|cut| cut < value) as u16)
                .collect();
            cuts.push(feature_cuts);
            bins.push(feature_bins);
        }

        Self { cuts, bins }
    }
}

/// Ascending cut points; a value lands in bin `i` when it is `<= cuts[i]` and above the
/// previous cut, or in the last bin when it exceeds every cut.
fn quantile_cuts(column: &[f64], max_bins: usize) -> Vec<f64> {
    let mut unique: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
    unique.sort_by(f64::total_cmp);
    unique.dedup();

    if unique.len() <= 1 {
        return Vec::new();
    }
    if unique.len() <= max_bins {
        unique.pop();
        return unique;
    }

    let mut cuts: Vec<f64> = (1..max_bins)
        .map(|quantile| unique[quantile * unique.len() / max_bins - 1])
        .collect();
    cuts.dedup();
    cuts
}

fn leaf_weight(gradient: f64, hessian: f64, lambda: f64, lower: f64, upper: f64) -> f64 {
    (-gradient / (hessian + lambda)).clamp(lower, upper)
}

fn gain_given_weight(gradient: f64, hessian: f64, lambda: f64, weight: f64) -> f64 {
    -(2.0 * gradient * weight + (hessian + lambda) * weight * weight)
}

struct SplitCandidate {
    feature: usize,
    bin: usize,
    gain: f64,
    left_weight: f64,
    right_weight: f64,
}

struct TreeBuilder<'a> {
    binned: &'a BinnedMatrix,
    gradients: &'a [f64],
    hessians: &'a [f64],
    params: &'a BoostingParams,
    constraints: &'a [MonotoneConstraint; FEATURE_COUNT],
    nodes: Vec<TreeNode>,
}

impl TreeBuilder<'_> {
    fn grow(&mut self, rows: Vec<usize>, depth: usize, lower: f64, upper: f64) -> usize {
        let gradient: f64 = rows.iter().map(|&row| self.gradients[row]).sum();
        let hessian: f64 = rows.iter().map(|&row| self.hessians[row]).sum();
        let weight = leaf_weight(gradient, hessian, self.params.lambda, lower, upper);

        let index = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            value: weight * self.params.learning_rate,
        });

        if depth >= self.params.max_depth || rows.len() < 2 {
            return index;
        }

        let Some(split) = self.best_split(&rows, gradient, hessian, weight, lower, upper) else {
            return index;
        };

        let feature_bins = &self.binned.bins[split.feature];
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&row| usize::from(feature_bins[row]) <= split.bin);

        let mid = (split.left_weight + split.right_weight) / 2.0;
        let ((left_lower, left_upper), (right_lower, right_upper)) =
            match self.constraints[split.feature] {
                MonotoneConstraint::Increasing => ((lower, mid), (mid, upper)),
                MonotoneConstraint::Decreasing => ((mid, upper), (lower, mid)),
                MonotoneConstraint::Unconstrained => ((lower, upper), (lower, upper)),
            };

        let left = self.grow(left_rows, depth + 1, left_lower, left_upper);
        let right = self.grow(right_rows, depth + 1, right_lower, right_upper);

        self.nodes[index] = TreeNode::Split {
            feature: split.feature,
            threshold: self.binned.cuts[split.feature][split.bin],
            left,
            right,
        };
        index
    }

    fn best_split(
        &self,
        rows: &[usize],
        gradient: f64,
        hessian: f64,
        weight: f64,
        lower: f64,
        upper: f64,
    ) -> Option<SplitCandidate> {
        let lambda = self.params.lambda;
        let min_child_weight = self.params.min_child_weight;
        let parent_gain = gain_given_weight(gradient, hessian, lambda, weight);
        let mut best: Option<SplitCandidate> = None;

        for feature in 0..FEATURE_COUNT {
            let cuts = &self.binned.cuts[feature];
            if cuts.is_empty() {
                continue;
            }

            let mut grad_hist = vec![0.0; cuts.len() + 1];
            let mut hess_hist = vec![0.0; cuts.len() + 1];
            for &row in rows {
                let bin = usize::from(self.binned.bins[feature][row]);
                grad_hist[bin] += self.gradients[row];
                hess_hist[bin] += self.hessians[row];
            }

            let mut left_gradient = 0.0;
            let mut left_hessian = 0.0;
            for bin in 0..cuts.len() {
                left_gradient += grad_hist[bin];
                left_hessian += hess_hist[bin];
                let right_gradient = gradient - left_gradient;
                let right_hessian = hessian - left_hessian;
                if left_hessian < min_child_weight || right_hessian < min_child_weight {
                    continue;
                }

                let left_weight = leaf_weight(left_gradient, left_hessian, lambda, lower, upper);
                let right_weight =
                    leaf_weight(right_gradient, right_hessian, lambda, lower, upper);
                let violates = match self.constraints[feature] {
                    MonotoneConstraint::Increasing => left_weight > right_weight,
                    MonotoneConstraint::Decreasing => left_weight < right_weight,
                    MonotoneConstraint::Unconstrained => false,
                };
                if violates {
                    continue;
                }

                let gain = gain_given_weight(left_gradient, left_hessian, lambda, left_weight)
                    + gain_given_weight(right_gradient, right_hessian, lambda, right_weight)
                    - parent_gain;
                let improves = best.as_ref().map_or(true, |current| gain > current.gain);
                if gain > 1e-9 && improves {
                    best = Some(SplitCandidate {
                        feature,
                        bin,
                        gain,
                        left_weight,
                        right_weight,
                    });
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_column(values: &[f64]) -> Vec<FeatureVector> {
        values
            .iter()
            .map(|value| {
                let mut row = [0.0; FEATURE_COUNT];
                row[0] = *value;
                FeatureVector(row)
            })
            .collect()
    }

    fn small_params() -> BoostingParams {
        BoostingParams {
            rounds: 50,
            max_depth: 3,
            ..BoostingParams::default()
        }
    }

    fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
        let mean = actual.iter().sum::<f64>() / actual.len() as f64;
        let residual: f64 = actual
            .iter()
            .zip(predicted)
            .map(|(a, p)| (a - p).powi(2))
            .sum();
        let total: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
        1.0 - residual / total
    }

    #[test]
    fn fits_a_linear_signal() {
        let xs: Vec<f64> = (0..200).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x + 10.0).collect();
        let rows = single_column(&xs);
        let model = GradientBoostedRegressor::fit(
            &rows,
            &ys,
            &small_params(),
            &[MonotoneConstraint::Unconstrained; FEATURE_COUNT],
        )
        .expect("fits");

        let predicted: Vec<f64> = rows.iter().map(|row| model.predict(row)).collect();
        assert_eq!(model.tree_count(), 50);
        assert!(r_squared(&ys, &predicted) > 0.9);
    }

    #[test]
    fn increasing_constraint_holds_against_a_wavy_target() {
        let xs: Vec<f64> = (0..300).map(|x| f64::from(x) / 10.0).collect();
        let ys: Vec<f64> = xs.iter().map(|x| (x * 1.7).sin() * 20.0 + x).collect();
        let rows = single_column(&xs);
        let mut constraints = [MonotoneConstraint::Unconstrained; FEATURE_COUNT];
        constraints[0] = MonotoneConstraint::Increasing;

        let model = GradientBoostedRegressor::fit(&rows, &ys, &small_params(), &constraints)
            .expect("fits");

        let grid = single_column(&(0..600).map(|x| f64::from(x) / 20.0 - 0.5).collect::<Vec<_>>());
        let predictions: Vec<f64> = grid.iter().map(|row| model.predict(row)).collect();
        assert!(predictions
            .windows(2)
            .all(|pair| pair[1] >= pair[0] - 1e-9));
    }

    #[test]
    fn decreasing_constraint_holds_against_a_rising_target() {
        let xs: Vec<f64> = (0..200).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|x| x * 2.0).collect();
        let rows = single_column(&xs);
        let mut constraints = [MonotoneConstraint::Unconstrained; FEATURE_COUNT];
        constraints[0] = MonotoneConstraint::Decreasing;

        let model = GradientBoostedRegressor::fit(&rows, &ys, &small_params(), &constraints)
            .expect("fits");

        let low = model.predict(&rows[0]);
        let high = model.predict(&rows[199]);
        assert!(high <= low + 1e-9);
    }

    #[test]
    fn rejects_mismatched_targets() {
        let rows = single_column(&[1.0, 2.0]);
        let result = GradientBoostedRegressor::fit(
            &rows,
            &[1.0],
            &small_params(),
            &[MonotoneConstraint::Unconstrained; FEATURE_COUNT],
        );
        assert!(matches!(result, Err(ModelError::DegenerateDataset { .. })));
    }

    #[test]
    fn quantile_cuts_respect_bin_budget() {
        let column: Vec<f64> = (0..1000).map(f64::from).collect();
        let cuts = quantile_cuts(&column, 64);
        assert!(cuts.len() <= 63);
        assert!(cuts.windows(2).all(|pair| pair[0] < pair[1]));

        assert!(quantile_cuts(&[4.0, 4.0, 4.0], 64).is_empty());
        assert_eq!(quantile_cuts(&[1.0, 3.0, 2.0], 64), vec![1.0, 2.0]);
    }

    #[test]
    fn validate_flags_out_of_order_children() {
        let model = GradientBoostedRegressor {
            base_score: 500.0,
            trees: vec![RegressionTree {
                nodes: vec![TreeNode::Split {
                    feature: 0,
                    threshold: 1.0,
                    left: 0,
                    right: 0,
                }],
            }],
        };
        assert!(matches!(model.validate(), Err(ModelError::Corrupt { .. })));
    }
}
