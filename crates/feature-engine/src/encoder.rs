//! Feature Vector Assembly

use crate::record::{one_hot_column, PropertyRecord};
use crate::schema::ColumnSchema;
use ndarray::Array2;
use std::sync::Arc;
use tracing::debug;

/// Feature vector laid out against a column schema
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    /// One value per schema column, in schema order
    pub values: Vec<f64>,
}

impl FeatureVector {
    /// Number of features
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the raw values
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

/// Encodes property records against a fixed column schema
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    schema: Arc<ColumnSchema>,
}

impl FeatureEncoder {
    /// Create an encoder for a schema
    pub fn new(schema: ColumnSchema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    /// Schema this encoder lays vectors out against
    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Encode one record.
    ///
    /// Numeric fields fill the column of the same name, each categorical
    /// value sets its `{field}_{value}` column to 1. Columns the record does
    /// not produce stay 0 and produced columns missing from the schema are
    /// dropped, so the output always has `schema.len()` entries.
    pub fn encode(&self, record: &PropertyRecord) -> FeatureVector {
        let mut values = vec![0.0; self.schema.len()];
        self.fill_row(record, &mut values);
        FeatureVector { values }
    }

    /// Encode many records into a row-major matrix
    pub fn encode_batch(&self, records: &[PropertyRecord]) -> Array2<f64> {
        let mut matrix = Array2::zeros((records.len(), self.schema.len()));
        for (mut row, record) in matrix.rows_mut().into_iter().zip(records) {
            if let Some(slice) = row.as_slice_mut() {
                self.fill_row(record, slice);
            }
        }
        debug!(
            "Encoded {} records into {} columns",
            records.len(),
            self.schema.len()
        );
        matrix
    }

    fn fill_row(&self, record: &PropertyRecord, row: &mut [f64]) {
        for (name, value) in record.numeric_values() {
            if let Some(idx) = self.schema.position(name) {
                row[idx] = value;
            }
        }

        for (field, value) in record.categorical_values() {
            if let Some(idx) = self.schema.position(&one_hot_column(field, value)) {
                row[idx] = 1.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn training_records() -> Vec<PropertyRecord> {
        vec![
            PropertyRecord {
                area_sqft: 1200.0,
                bedrooms: 3,
                bathrooms: 2,
                location: "Mont Kiara".to_string(),
                listing_type: "rent".to_string(),
                property_type: "Condo".to_string(),
            },
            PropertyRecord {
                area_sqft: 650.0,
                bedrooms: 1,
                bathrooms: 1,
                location: "Cheras".to_string(),
                listing_type: "sale".to_string(),
                property_type: "Apartment".to_string(),
            },
        ]
    }

    #[test]
    fn test_encode_known_values() {
        let encoder = FeatureEncoder::new(ColumnSchema::fit(&training_records()));
        let features = encoder.encode(&training_records()[0]);
        let schema = encoder.schema();

        assert_eq!(features.len(), schema.len());
        assert_eq!(features.values[schema.position("area_sqft").unwrap()], 1200.0);
        assert_eq!(features.values[schema.position("bedrooms").unwrap()], 3.0);
        assert_eq!(features.values[schema.position("location_Mont Kiara").unwrap()], 1.0);
        assert_eq!(features.values[schema.position("location_Cheras").unwrap()], 0.0);
        assert_eq!(features.values[schema.position("listing_type_rent").unwrap()], 1.0);
        assert_eq!(features.values.iter().filter(|&&v| v == 1.0).count(), 3);
    }

    #[test]
    fn test_unseen_category_is_all_zero() {
        let encoder = FeatureEncoder::new(ColumnSchema::fit(&training_records()));
        let mut record = training_records()[0].clone();
        record.location = "Penang".to_string();

        let features = encoder.encode(&record);
        let schema = encoder.schema();
        let location_hot = schema
            .columns()
            .iter()
            .zip(&features.values)
            .filter(|&(name, &v)| name.starts_with("location_") && v != 0.0)
            .count();

        assert_eq!(features.len(), schema.len());
        assert_eq!(location_hot, 0);
    }

    #[test]
    fn test_reindex_against_foreign_schema() {
        let schema = ColumnSchema::from_columns(vec![
            "location_Cheras".to_string(),
            "area_sqft".to_string(),
            "unused".to_string(),
        ])
        .unwrap();
        let encoder = FeatureEncoder::new(schema);
        let features = encoder.encode(&training_records()[1]);
        assert_eq!(features.values, vec![1.0, 650.0, 0.0]);
    }

    #[test]
    fn test_batch_matches_single() {
        let records = training_records();
        let encoder = FeatureEncoder::new(ColumnSchema::fit(&records));
        let matrix = encoder.encode_batch(&records);

        assert_eq!(matrix.dim(), (2, encoder.schema().len()));
        for (row, record) in matrix.rows().into_iter().zip(&records) {
            assert_eq!(row.to_vec(), encoder.encode(record).values);
        }
    }

    proptest! {
        #[test]
        fn prop_encoded_width_matches_schema(
            area in 0.0f64..50_000.0,
            bedrooms in 0u32..12,
            bathrooms in 0u32..12,
            location in "[A-Za-z ]{0,20}",
            listing_type in "(rent|sale|lease)",
            property_type in "[A-Za-z-]{0,16}",
        ) {
            let encoder = FeatureEncoder::new(ColumnSchema::fit(&training_records()));
            let record = PropertyRecord {
                area_sqft: area,
                bedrooms,
                bathrooms,
                location,
                listing_type,
                property_type,
            };
            let features = encoder.encode(&record);
            prop_assert_eq!(features.len(), encoder.schema().len());
        }
    }
}
