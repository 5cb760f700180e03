//! Price Predictor

use crate::model::{Regressor, TrainedModel};
use crate::ModelError;
use feature_engine::{restore_target, ColumnSchema, FeatureEncoder, PropertyRecord};
use tracing::{debug, info};

/// Result of a single price prediction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceEstimate {
    /// Price in currency units, rounded to two decimals
    pub price: f64,
}

/// A fitted model bound to the columns it was trained on
#[derive(Debug, Clone)]
pub struct PricePredictor {
    model: TrainedModel,
    encoder: FeatureEncoder,
}

impl PricePredictor {
    /// Pair a fitted model with its column schema.
    ///
    /// Fails if the model is unfitted or was fitted on a different width.
    pub fn new(model: TrainedModel, schema: ColumnSchema) -> Result<Self, ModelError> {
        let width = model.n_features().ok_or(ModelError::NotFitted)?;
        if width != schema.len() {
            return Err(ModelError::SchemaMismatch {
                model: width,
                schema: schema.len(),
            });
        }

        info!("Price predictor ready: {} over {} columns", model.name(), width);
        Ok(Self {
            model,
            encoder: FeatureEncoder::new(schema),
        })
    }

    /// Estimate the price of one property
    pub fn predict(&self, record: &PropertyRecord) -> Result<PriceEstimate, ModelError> {
        if !record.area_sqft.is_finite() || record.area_sqft < 0.0 {
            return Err(ModelError::InvalidInput(format!(
                "area_sqft must be a non-negative number, got {}",
                record.area_sqft
            )));
        }

        let features = self.encoder.encode(record);
        let log_price = self.model.predict_row(features.as_slice())?;
        // Rounding can itself overflow for prices near f64::MAX
        let price = round_cents(restore_target(log_price));
        if !price.is_finite() {
            return Err(ModelError::NonFinitePrediction(log_price));
        }

        debug!(
            "Predicted {:.2} for {} in {}",
            price, record.property_type, record.location
        );
        Ok(PriceEstimate { price })
    }

    /// The underlying model
    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    /// Column schema requests are encoded against
    pub fn schema(&self) -> &ColumnSchema {
        self.encoder.schema()
    }
}

/// Two-decimal rounding, ties to even
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelKind;
    use feature_engine::log_target;

    fn record(location: &str, area: f64, bedrooms: u32) -> PropertyRecord {
        PropertyRecord {
            area_sqft: area,
            bedrooms,
            bathrooms: 2,
            location: location.to_string(),
            listing_type: "rent".to_string(),
            property_type: "Condominium".to_string(),
        }
    }

    fn fitted(kind: ModelKind) -> PricePredictor {
        let records: Vec<PropertyRecord> = (0..30)
            .map(|i| {
                let location = if i % 2 == 0 { "Mont Kiara" } else { "Cheras" };
                record(location, 600.0 + 40.0 * i as f64, 1 + (i % 4) as u32)
            })
            .collect();
        let schema = ColumnSchema::fit(&records);
        let encoder = FeatureEncoder::new(schema.clone());
        let x = encoder.encode_batch(&records);
        let y = records
            .iter()
            .map(|r| log_target(r.area_sqft * 3.0 + if r.location == "Mont Kiara" { 800.0 } else { 0.0 }))
            .collect();

        let mut model = kind.build(42);
        model.fit(&x, &y).unwrap();
        PricePredictor::new(model, schema).unwrap()
    }

    #[test]
    fn test_predict_is_deterministic_and_rounded() {
        let predictor = fitted(ModelKind::Ridge);
        let input = record("Mont Kiara", 1000.0, 3);

        let first = predictor.predict(&input).unwrap();
        let second = predictor.predict(&input).unwrap();
        assert_eq!(first, second);
        assert!(first.price > 0.0);
        assert_eq!(first.price, (first.price * 100.0).round() / 100.0);
    }

    #[test]
    fn test_unseen_location_still_predicts() {
        let predictor = fitted(ModelKind::DecisionTree);
        let estimate = predictor.predict(&record("Atlantis", 900.0, 2)).unwrap();
        assert!(estimate.price.is_finite());
    }

    #[test]
    fn test_rejects_negative_area() {
        let predictor = fitted(ModelKind::Linear);
        let result = predictor.predict(&record("Cheras", -5.0, 1));
        assert!(matches!(result, Err(ModelError::InvalidInput(_))));
    }

    #[test]
    fn test_overflowing_price_is_rejected() {
        // log-price equal to the area, so large areas push exp_m1 to the top of f64
        let records: Vec<PropertyRecord> = (1..=20).map(|i| record("Cheras", i as f64 * 10.0, 2)).collect();
        let schema = ColumnSchema::fit(&records);
        let x = FeatureEncoder::new(schema.clone()).encode_batch(&records);
        let y = records.iter().map(|r| r.area_sqft).collect();
        let mut model = ModelKind::Linear.build(0);
        model.fit(&x, &y).unwrap();
        let predictor = PricePredictor::new(model, schema).unwrap();

        // exp_m1(707) is finite but times 100 it is not
        for area in [707.0, 720.0] {
            let result = predictor.predict(&record("Cheras", area, 2));
            assert!(
                matches!(result, Err(ModelError::NonFinitePrediction(_))),
                "area {} gave {:?}",
                area,
                result
            );
        }
        assert!(predictor.predict(&record("Cheras", 50.0, 2)).unwrap().price.is_finite());
    }

    #[test]
    fn test_round_cents_ties_to_even() {
        assert_eq!(round_cents(0.125), 0.12);
        assert_eq!(round_cents(0.375), 0.38);
        assert_eq!(round_cents(1234.5678), 1234.57);
    }

    #[test]
    fn test_schema_width_must_match_model() {
        let predictor = fitted(ModelKind::Linear);
        let narrow = ColumnSchema::from_columns(vec!["area_sqft".to_string()]).unwrap();
        let result = PricePredictor::new(predictor.model().clone(), narrow);
        assert!(matches!(result, Err(ModelError::SchemaMismatch { schema: 1, .. })));

        let unfitted = PricePredictor::new(ModelKind::Linear.build(0), predictor.schema().clone());
        assert_eq!(unfitted.err(), Some(ModelError::NotFitted));
    }
}
