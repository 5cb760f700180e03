//! Service Status Routes

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::AppState;

/// Greeting served at `/`
pub const WELCOME_MESSAGE: &str = "Welcome to the Rentverse Prediction Service API";

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ready` or `unloaded`
    pub status: &'static str,
    pub version: String,
    pub uptime_seconds: u64,
    pub model: Option<ModelInfo>,
}

/// The model being served
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub n_features: usize,
    pub run_id: Option<String>,
    pub trained_at: Option<String>,
    pub r2: Option<f64>,
}

pub async fn root() -> Json<Value> {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let model = state.predictor.as_ref().map(|predictor| {
        let metadata = state.metadata.as_ref();
        ModelInfo {
            name: predictor.model().name().to_string(),
            n_features: predictor.schema().len(),
            run_id: metadata.map(|m| m.run_id.to_string()),
            trained_at: metadata.map(|m| m.trained_at.to_rfc3339()),
            r2: metadata.map(|m| m.r2),
        }
    });

    Json(HealthResponse {
        status: if model.is_some() { "ready" } else { "unloaded" },
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model,
    })
}

/// Prometheus exposition; empty when no recorder is installed
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
