//! Random Forest Regressor

use crate::tree::{DecisionTreeConfig, DecisionTreeRegressor};
use crate::{check_training_shape, check_width, ModelError};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Strategy for features considered at each split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Fraction of n_features
    Fraction(f64),
    /// All features
    All,
}

impl MaxFeatures {
    fn resolve(&self, n_features: usize) -> Option<usize> {
        match *self {
            MaxFeatures::Sqrt => Some(((n_features as f64).sqrt().ceil() as usize).max(1)),
            MaxFeatures::Fraction(f) => Some(((n_features as f64 * f).ceil() as usize).clamp(1, n_features)),
            MaxFeatures::All => None,
        }
    }
}

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub random_state: u64,
}

impl Default for RandomForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: true,
            random_state: 42,
        }
    }
}

/// Bagged ensemble of regression trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    pub config: RandomForestConfig,
    trees: Vec<DecisionTreeRegressor>,
    n_features: usize,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(RandomForestConfig::default())
    }
}

impl RandomForestRegressor {
    /// Create an unfitted forest
    pub fn new(config: RandomForestConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            n_features: 0,
        }
    }

    /// Fit the forest. Trees are grown in parallel, each from its own seeded
    /// generator, so the result does not depend on thread scheduling.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        check_training_shape(x, y)?;
        if self.config.n_estimators == 0 {
            return Err(ModelError::InvalidInput("n_estimators must be positive".to_string()));
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();
        let tree_config = DecisionTreeConfig {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            max_features: self.config.max_features.resolve(n_features),
            random_state: self.config.random_state,
        };
        let base_seed = self.config.random_state;
        let bootstrap = self.config.bootstrap;

        let trees: Vec<DecisionTreeRegressor> = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));
                let indices: Vec<usize> = if bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = DecisionTreeRegressor::new(tree_config.clone());
                tree.fit_rows(x, y, indices, &mut rng);
                tree
            })
            .collect();

        debug!(
            "Fitted random forest: {} trees, max depth {}",
            trees.len(),
            trees.iter().map(DecisionTreeRegressor::depth).max().unwrap_or(0)
        );

        self.trees = trees;
        self.n_features = n_features;
        Ok(())
    }

    /// Average of the tree predictions for one row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict_row(row)?;
        }
        Ok(sum / self.trees.len() as f64)
    }

    /// Predict every row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_width(self.n_features, x)?;

        let predictions = x
            .rows()
            .into_iter()
            .map(|row| row.to_vec())
            .collect::<Vec<_>>()
            .par_iter()
            .map(|row| self.predict_row(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Array1::from_vec(predictions))
    }

    /// Mean impurity-based feature importances across trees
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut importances = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, v) in importances.iter_mut().zip(tree.feature_importances()) {
                *acc += v;
            }
        }
        let n = self.trees.len().max(1) as f64;
        importances.iter_mut().for_each(|v| *v /= n);
        importances
    }

    /// Number of fitted trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of input features, once fitted
    pub fn n_features(&self) -> Option<usize> {
        (!self.trees.is_empty()).then_some(self.n_features)
    }
}
