//! Column Schema
//!
//! The ordered list of feature columns agreed at training time. It is
//! persisted next to the model and every vector fed to that model is laid out
//! against it.

use crate::record::{one_hot_column, PropertyRecord, CATEGORICAL_FIELDS, NUMERIC_FIELDS};
use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Ordered, duplicate-free set of column names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ColumnSchema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl ColumnSchema {
    /// Build a schema from an explicit column list
    pub fn from_columns(columns: Vec<String>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateColumn(name.clone()));
            }
        }

        Ok(Self { columns, index })
    }

    /// Derive the schema from the records a model is about to be trained on.
    ///
    /// Layout: the numeric columns first, then for each categorical field the
    /// distinct values it takes in `records`, sorted, as `{field}_{value}`.
    pub fn fit(records: &[PropertyRecord]) -> Self {
        let mut columns: Vec<String> = NUMERIC_FIELDS.iter().map(|s| s.to_string()).collect();

        for (field_idx, field) in CATEGORICAL_FIELDS.iter().enumerate() {
            let values: BTreeSet<&str> = records
                .iter()
                .map(|r| r.categorical_values()[field_idx].1)
                .collect();
            debug!("Field {} has {} distinct values", field, values.len());
            columns.extend(values.into_iter().map(|v| one_hot_column(field, v)));
        }

        let index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Self { columns, index }
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the schema has no columns (never true for a constructed schema)
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column, if present
    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    /// Whether the schema contains a column
    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl TryFrom<Vec<String>> for ColumnSchema {
    type Error = SchemaError;

    fn try_from(columns: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_columns(columns)
    }
}

impl From<ColumnSchema> for Vec<String> {
    fn from(schema: ColumnSchema) -> Self {
        schema.columns
    }
}
