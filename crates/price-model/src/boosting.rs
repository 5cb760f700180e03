//! Gradient Boosting Regressor
//!
//! Least-squares boosting: each stage fits a shallow regression tree to the
//! residuals of the ensemble so far and is added with a shrinkage factor.

use crate::tree::{DecisionTreeConfig, DecisionTreeRegressor};
use crate::{check_training_shape, check_width, ModelError};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Gradient Boosting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting stages
    pub n_estimators: usize,
    /// Shrinkage applied to each stage
    pub learning_rate: f64,
    /// Depth of each stage's tree
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Fraction of rows drawn (without replacement) for each stage
    pub subsample: f64,
    /// Random seed
    pub random_state: u64,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            random_state: 42,
        }
    }
}

/// Gradient Boosting Regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    pub config: GradientBoostingConfig,
    trees: Vec<DecisionTreeRegressor>,
    initial_prediction: f64,
    n_features: usize,
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self::new(GradientBoostingConfig::default())
    }
}

impl GradientBoostingRegressor {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            initial_prediction: 0.0,
            n_features: 0,
        }
    }

    /// Fit the boosted ensemble
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        check_training_shape(x, y)?;
        let n_samples = x.nrows();

        self.trees.clear();
        self.n_features = x.ncols();
        self.initial_prediction = y.mean().unwrap_or(0.0);

        let mut predictions = Array1::from_elem(n_samples, self.initial_prediction);
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.random_state);
        let tree_config = DecisionTreeConfig {
            max_depth: Some(self.config.max_depth),
            min_samples_leaf: self.config.min_samples_leaf,
            random_state: self.config.random_state,
            ..Default::default()
        };

        for _ in 0..self.config.n_estimators {
            let residuals = y - &predictions;
            let rows = self.subsample_rows(n_samples, &mut rng);

            let mut tree = DecisionTreeRegressor::new(tree_config.clone());
            tree.fit_rows(x, &residuals, rows, &mut rng);

            // Every row moves, including those left out of this stage's sample
            let update = tree.predict(x)?;
            predictions.scaled_add(self.config.learning_rate, &update);

            self.trees.push(tree);
        }

        debug!(
            "Fitted gradient boosting: {} stages, lr={}",
            self.trees.len(),
            self.config.learning_rate
        );
        Ok(())
    }

    fn subsample_rows(&self, n: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        if self.config.subsample < 1.0 {
            let size = ((n as f64 * self.config.subsample).ceil() as usize).clamp(1, n);
            indices.shuffle(rng);
            indices.truncate(size);
            indices.sort_unstable();
        }
        indices
    }

    /// Predict one row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        let mut value = self.initial_prediction;
        for tree in &self.trees {
            value += self.config.learning_rate * tree.predict_row(row)?;
        }
        Ok(value)
    }

    /// Predict every row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_width(self.n_features, x)?;

        let mut predictions = Array1::from_elem(x.nrows(), self.initial_prediction);
        for tree in &self.trees {
            predictions.scaled_add(self.config.learning_rate, &tree.predict(x)?);
        }
        Ok(predictions)
    }

    /// Number of input features, once fitted
    pub fn n_features(&self) -> Option<usize> {
        (!self.trees.is_empty()).then_some(self.n_features)
    }
}
