//! Price Model Training
//!
//! Turns the cleaned listings dataset into a persisted model: outlier
//! filtering, encoding, a seeded hold-out split, and a comparison of the
//! candidate regressors on held-out prices.

mod dataset;
mod trainer;

pub use dataset::{filter_outliers, quantile, train_test_split, OutlierBounds, Split};
pub use trainer::{CandidateResult, Trainer, TrainingConfig, TrainingOutcome, TrainingReport};

use std::path::PathBuf;
use thiserror::Error;

/// Training errors
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Dataset not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Not enough data: {0}")]
    InsufficientData(String),

    #[error("Model error: {0}")]
    Model(#[from] price_model::ModelError),

    #[error("Data error: {0}")]
    Clean(data_cleaner::CleanError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),
}

impl From<data_cleaner::CleanError> for TrainError {
    fn from(err: data_cleaner::CleanError) -> Self {
        match err {
            data_cleaner::CleanError::MissingInput(path) => TrainError::MissingInput(path),
            other => TrainError::Clean(other),
        }
    }
}
