//! Property Price Models
//!
//! Regressors fitted on log prices, plus [`PricePredictor`], which ties a
//! fitted model to the column schema it was trained against.

mod boosting;
mod forest;
mod linear;
mod metrics;
mod model;
mod predictor;
mod tree;

pub use boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use forest::{MaxFeatures, RandomForestConfig, RandomForestRegressor};
pub use linear::LinearRegression;
pub use metrics::{mean_absolute_error, r2_score, root_mean_squared_error, RegressionMetrics};
pub use model::{ModelKind, Regressor, TrainedModel, DEFAULT_RIDGE_ALPHA};
pub use predictor::{PriceEstimate, PricePredictor};
pub use tree::{DecisionTreeConfig, DecisionTreeRegressor};

use thiserror::Error;

/// Errors during fitting or prediction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Model has not been fitted")]
    NotFitted,
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
    #[error("Not enough data: {0}")]
    InsufficientData(String),
    #[error("Linear system could not be solved: {0}")]
    SingularMatrix(String),
    #[error("Model expects {model} features but the column schema has {schema}")]
    SchemaMismatch { model: usize, schema: usize },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Prediction is not a finite number: {0}")]
    NonFinitePrediction(f64),
}

/// Check that a design matrix and target agree and are non-empty
pub(crate) fn check_training_shape(
    x: &ndarray::Array2<f64>,
    y: &ndarray::Array1<f64>,
) -> Result<(), ModelError> {
    if x.nrows() != y.len() {
        return Err(ModelError::InvalidInputShape {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ModelError::InsufficientData(format!(
            "training matrix is {}x{}",
            x.nrows(),
            x.ncols()
        )));
    }
    Ok(())
}

/// Check that a matrix has the width a fitted model expects
pub(crate) fn check_width(expected: usize, x: &ndarray::Array2<f64>) -> Result<(), ModelError> {
    if x.ncols() != expected {
        return Err(ModelError::InvalidInputShape {
            expected: format!("{} features", expected),
            actual: format!("{} features", x.ncols()),
        });
    }
    Ok(())
}
