//! Model Menu
//!
//! [`ModelKind`] names each candidate the trainer can fit, [`TrainedModel`]
//! is the persisted form of whichever one won.

use crate::boosting::{GradientBoostingConfig, GradientBoostingRegressor};
use crate::forest::{RandomForestConfig, RandomForestRegressor};
use crate::linear::LinearRegression;
use crate::tree::{DecisionTreeConfig, DecisionTreeRegressor};
use crate::ModelError;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ridge penalty used by the default menu
pub const DEFAULT_RIDGE_ALPHA: f64 = 1.0;

/// Common interface of every regressor on the menu
pub trait Regressor {
    /// Fit on a design matrix and target
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError>;

    /// Predict every row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError>;

    /// Feature count the model was fitted with, if fitted
    fn n_features(&self) -> Option<usize>;

    /// Predict one row
    fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        let x = Array2::from_shape_vec((1, row.len()), row.to_vec()).map_err(|e| {
            ModelError::InvalidInputShape {
                expected: "a single row".to_string(),
                actual: e.to_string(),
            }
        })?;
        Ok(self.predict(&x)?[0])
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        LinearRegression::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        LinearRegression::predict(self, x)
    }

    fn n_features(&self) -> Option<usize> {
        LinearRegression::n_features(self)
    }
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        DecisionTreeRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        DecisionTreeRegressor::predict(self, x)
    }

    fn n_features(&self) -> Option<usize> {
        DecisionTreeRegressor::n_features(self)
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        DecisionTreeRegressor::predict_row(self, row)
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        RandomForestRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        RandomForestRegressor::predict(self, x)
    }

    fn n_features(&self) -> Option<usize> {
        RandomForestRegressor::n_features(self)
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        RandomForestRegressor::predict_row(self, row)
    }
}

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        GradientBoostingRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        GradientBoostingRegressor::predict(self, x)
    }

    fn n_features(&self) -> Option<usize> {
        GradientBoostingRegressor::n_features(self)
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        GradientBoostingRegressor::predict_row(self, row)
    }
}

/// Candidate model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Linear,
    Ridge,
    DecisionTree,
    RandomForest,
    GradientBoosting,
}

impl ModelKind {
    /// Every kind, in menu order
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Linear,
        ModelKind::Ridge,
        ModelKind::DecisionTree,
        ModelKind::RandomForest,
        ModelKind::GradientBoosting,
    ];

    /// Candidates fitted when none are requested
    pub fn default_menu() -> Vec<ModelKind> {
        vec![
            ModelKind::Linear,
            ModelKind::Ridge,
            ModelKind::RandomForest,
            ModelKind::GradientBoosting,
        ]
    }

    /// Machine name, as accepted on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Linear => "linear",
            ModelKind::Ridge => "ridge",
            ModelKind::DecisionTree => "decision_tree",
            ModelKind::RandomForest => "random_forest",
            ModelKind::GradientBoosting => "gradient_boosting",
        }
    }

    /// Human-readable name used in reports
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::Linear => "Linear Regression",
            ModelKind::Ridge => "Ridge Regression",
            ModelKind::DecisionTree => "Decision Tree",
            ModelKind::RandomForest => "Random Forest",
            ModelKind::GradientBoosting => "Gradient Boosting",
        }
    }

    /// Build an unfitted model of this kind with default hyperparameters
    pub fn build(&self, seed: u64) -> TrainedModel {
        match self {
            ModelKind::Linear => TrainedModel::Linear(LinearRegression::new()),
            ModelKind::Ridge => TrainedModel::Ridge(LinearRegression::ridge(DEFAULT_RIDGE_ALPHA)),
            ModelKind::DecisionTree => TrainedModel::DecisionTree(DecisionTreeRegressor::new(DecisionTreeConfig {
                random_state: seed,
                ..Default::default()
            })),
            ModelKind::RandomForest => TrainedModel::RandomForest(RandomForestRegressor::new(RandomForestConfig {
                random_state: seed,
                ..Default::default()
            })),
            ModelKind::GradientBoosting => {
                TrainedModel::GradientBoosting(GradientBoostingRegressor::new(GradientBoostingConfig {
                    random_state: seed,
                    ..Default::default()
                }))
            }
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| ModelError::InvalidInput(format!("unknown model kind '{}'", s)))
    }
}

/// A model of any kind on the menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrainedModel {
    Linear(LinearRegression),
    Ridge(LinearRegression),
    DecisionTree(DecisionTreeRegressor),
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
}

impl TrainedModel {
    /// Kind of the wrapped model
    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::Linear(_) => ModelKind::Linear,
            TrainedModel::Ridge(_) => ModelKind::Ridge,
            TrainedModel::DecisionTree(_) => ModelKind::DecisionTree,
            TrainedModel::RandomForest(_) => ModelKind::RandomForest,
            TrainedModel::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        self.kind().display_name()
    }

    fn inner(&self) -> &dyn Regressor {
        match self {
            TrainedModel::Linear(m) | TrainedModel::Ridge(m) => m,
            TrainedModel::DecisionTree(m) => m,
            TrainedModel::RandomForest(m) => m,
            TrainedModel::GradientBoosting(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Regressor {
        match self {
            TrainedModel::Linear(m) | TrainedModel::Ridge(m) => m,
            TrainedModel::DecisionTree(m) => m,
            TrainedModel::RandomForest(m) => m,
            TrainedModel::GradientBoosting(m) => m,
        }
    }
}

impl Regressor for TrainedModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        self.inner().predict(x)
    }

    fn n_features(&self) -> Option<usize> {
        self.inner().n_features()
    }

    fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        self.inner().predict_row(row)
    }
}
