//! Feature Engineering Engine
//!
//! Turns property records into fixed-width numeric vectors. Training and
//! serving both go through [`FeatureEncoder`], so the column layout a model
//! was fitted on is exactly the layout it sees at prediction time.

mod encoder;
mod record;
mod schema;
mod target;

pub use encoder::{FeatureEncoder, FeatureVector};
pub use record::{ListingType, PropertyRecord, CATEGORICAL_FIELDS, NUMERIC_FIELDS, STUDIO_BEDROOMS};
pub use schema::ColumnSchema;
pub use target::{log_target, restore_target};

use thiserror::Error;

/// Errors raised while building or restoring a column schema
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Column schema is empty")]
    Empty,
    #[error("Duplicate column in schema: {0}")]
    DuplicateColumn(String),
}
