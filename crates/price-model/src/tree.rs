//! Regression Tree
//!
//! CART regression tree with variance-reduction splits. Indicator columns
//! (values 0/1 only) are split in one pass without sorting, which is what
//! keeps wide one-hot matrices cheap to fit.

use crate::{check_training_shape, check_width, ModelError};
use ndarray::{Array1, Array2};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Tree growth limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeConfig {
    /// Maximum depth; `None` grows until leaves are pure or too small
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in each child
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` means all
    pub max_features: Option<usize>,
    /// Seed for feature sampling
    pub random_state: u64,
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: 42,
        }
    }
}

/// Tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Sum of squared errors removed by the split
    gain: f64,
}

/// Regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    pub config: DecisionTreeConfig,
    root: Option<TreeNode>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new(DecisionTreeConfig::default())
    }
}

impl DecisionTreeRegressor {
    /// Create an unfitted tree
    pub fn new(config: DecisionTreeConfig) -> Self {
        Self {
            config,
            root: None,
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    /// Fit on every row of `x`
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        check_training_shape(x, y)?;
        let indices: Vec<usize> = (0..x.nrows()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.random_state);
        self.fit_rows(x, y, indices, &mut rng);
        Ok(())
    }

    /// Fit on a subset of rows (repeats allowed, as in a bootstrap sample)
    pub(crate) fn fit_rows(
        &mut self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
        rng: &mut ChaCha8Rng,
    ) {
        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        self.root = Some(self.build(x, y, indices, 0, rng, &mut importances));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = importances;
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: Vec<usize>,
        depth: usize,
        rng: &mut ChaCha8Rng,
        importances: &mut [f64],
    ) -> TreeNode {
        let n = indices.len();
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / n.max(1) as f64;

        let should_stop = n < self.config.min_samples_split
            || n < 2 * self.config.min_samples_leaf
            || self.config.max_depth.map_or(false, |d| depth >= d)
            || indices.iter().all(|&i| (y[i] - mean).abs() < 1e-12);

        if should_stop {
            return TreeNode::Leaf { value: mean };
        }

        let features = self.candidate_features(rng);
        let Some(best) = self.best_split(x, y, &indices, &features) else {
            return TreeNode::Leaf { value: mean };
        };

        importances[best.feature] += best.gain;

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[[i, best.feature]] <= best.threshold);

        let left = self.build(x, y, left_idx, depth + 1, rng, importances);
        let right = self.build(x, y, right_idx, depth + 1, rng, importances);

        TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn candidate_features(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        match self.config.max_features {
            Some(k) if k < self.n_features => {
                let mut features = sample(rng, self.n_features, k.max(1)).into_vec();
                features.sort_unstable();
                features
            }
            _ => (0..self.n_features).collect(),
        }
    }

    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        features: &[usize],
    ) -> Option<SplitCandidate> {
        let n = indices.len() as f64;
        let total: f64 = indices.iter().map(|&i| y[i]).sum();
        let parent_score = total * total / n;
        let min_leaf = self.config.min_samples_leaf;

        // Maximising sum_l^2/n_l + sum_r^2/n_r is minimising the children's SSE
        let mut best: Option<SplitCandidate> = None;
        let mut best_score = parent_score + 1e-12 * parent_score.abs().max(1.0);

        for &feature in features {
            let mut is_binary = true;
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for &i in indices {
                let v = x[[i, feature]];
                is_binary &= v == 0.0 || v == 1.0;
                min = min.min(v);
                max = max.max(v);
            }
            if min >= max {
                continue;
            }

            if is_binary {
                let (mut n_zero, mut sum_zero) = (0usize, 0.0f64);
                for &i in indices {
                    if x[[i, feature]] == 0.0 {
                        n_zero += 1;
                        sum_zero += y[i];
                    }
                }
                let n_one = indices.len() - n_zero;
                if n_zero < min_leaf || n_one < min_leaf {
                    continue;
                }
                let sum_one = total - sum_zero;
                let score = sum_zero * sum_zero / n_zero as f64 + sum_one * sum_one / n_one as f64;
                if score > best_score {
                    best_score = score;
                    best = Some(SplitCandidate {
                        feature,
                        threshold: 0.5,
                        gain: score - parent_score,
                    });
                }
                continue;
            }

            let mut pairs: Vec<(f64, f64)> = indices.iter().map(|&i| (x[[i, feature]], y[i])).collect();
            pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left_sum = 0.0;
            for k in 0..pairs.len() - 1 {
                left_sum += pairs[k].1;
                if pairs[k].0 >= pairs[k + 1].0 {
                    continue;
                }
                let n_left = k + 1;
                let n_right = pairs.len() - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let right_sum = total - left_sum;
                let score = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
                if score > best_score {
                    best_score = score;
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (pairs[k].0 + pairs[k + 1].0) / 2.0,
                        gain: score - parent_score,
                    });
                }
            }
        }

        best
    }

    /// Predict one row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        let mut node = self.root.as_ref().ok_or(ModelError::NotFitted)?;
        if row.len() != self.n_features {
            return Err(ModelError::InvalidInputShape {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", row.len()),
            });
        }

        loop {
            match node {
                TreeNode::Leaf { value } => return Ok(*value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Predict every row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if self.root.is_none() {
            return Err(ModelError::NotFitted);
        }
        check_width(self.n_features, x)?;
        x.rows()
            .into_iter()
            .map(|row| self.predict_row(&row.to_vec()))
            .collect::<Result<Vec<_>, _>>()
            .map(Array1::from_vec)
    }

    /// Normalised impurity decrease per feature
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// Number of input features, once fitted
    pub fn n_features(&self) -> Option<usize> {
        self.root.as_ref().map(|_| self.n_features)
    }

    /// Depth of the fitted tree
    pub fn depth(&self) -> usize {
        fn walk(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        self.root.as_ref().map_or(0, walk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Array2<f64>, Array1<f64>) {
        // column 0 numeric, column 1 indicator
        let x = Array2::from_shape_fn((60, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 3 == 0) as u8 as f64 });
        let y = (0..60)
            .map(|i| if i < 30 { 10.0 } else { 20.0 } + if i % 3 == 0 { 5.0 } else { 0.0 })
            .collect();
        (x, y)
    }

    #[test]
    fn test_fits_step_function() {
        let (x, y) = step_data();
        let mut tree = DecisionTreeRegressor::default();
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        for (p, t) in predictions.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-9);
        }
        assert_eq!(tree.predict_row(&[10.0, 1.0]).unwrap(), 15.0);
        assert_eq!(tree.predict_row(&[45.0, 0.0]).unwrap(), 20.0);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let (x, y) = step_data();
        let mut tree = DecisionTreeRegressor::new(DecisionTreeConfig {
            max_depth: Some(1),
            ..Default::default()
        });
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.depth(), 1);

        // The numeric step explains more variance than the indicator
        assert!(tree.feature_importances()[0] > tree.feature_importances()[1]);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let x = Array2::from_shape_fn((10, 2), |(i, j)| (i + j) as f64);
        let y = Array1::from_elem(10, 7.5);
        let mut tree = DecisionTreeRegressor::default();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict_row(&[100.0, -3.0]).unwrap(), 7.5);
    }

    #[test]
    fn test_unfitted_and_wrong_width() {
        let tree = DecisionTreeRegressor::default();
        assert_eq!(tree.predict_row(&[1.0]), Err(ModelError::NotFitted));

        let (x, y) = step_data();
        let mut tree = DecisionTreeRegressor::default();
        tree.fit(&x, &y).unwrap();
        assert!(matches!(tree.predict_row(&[1.0]), Err(ModelError::InvalidInputShape { .. })));
    }
}
