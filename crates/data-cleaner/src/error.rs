//! Cleaning Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading, cleaning, or writing listing data
#[derive(Debug, Error)]
pub enum CleanError {
    /// Input file does not exist
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// A column the cleaner relies on is absent from the file
    #[error("Column '{column}' missing from {}", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    /// File system failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing failure
    #[error("CSV error: {0}")]
    Csv(#[from] polars::prelude::PolarsError),
}
