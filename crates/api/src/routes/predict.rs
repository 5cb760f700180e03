//! Prediction Route

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use feature_engine::PropertyRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Response of `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_price_myr: f64,
}

/// Estimate the price of one property. The body is a [`PropertyRecord`];
/// every field is required.
pub async fn predict_price(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PropertyRecord>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let result = run_prediction(&state, payload);
    let outcome = match &result {
        Ok(_) => "ok",
        Err(ApiError::ModelNotLoaded) => "unloaded",
        Err(ApiError::InvalidInput(_)) => "invalid",
        Err(ApiError::Internal(_)) => "error",
    };
    metrics::counter!("price_predictions_total", "outcome" => outcome).increment(1);
    result.map(Json)
}

fn run_prediction(
    state: &AppState,
    payload: Result<Json<PropertyRecord>, JsonRejection>,
) -> Result<PredictResponse, ApiError> {
    let predictor = state.predictor.as_ref().ok_or(ApiError::ModelNotLoaded)?;
    let Json(record) = payload?;

    let start = Instant::now();
    let estimate = predictor.predict(&record)?;
    let elapsed = start.elapsed();
    metrics::histogram!("price_prediction_duration_seconds").record(elapsed.as_secs_f64());

    debug!("Prediction {:.2} in {:?}", estimate.price, elapsed);
    Ok(PredictResponse {
        predicted_price_myr: estimate.price,
    })
}
