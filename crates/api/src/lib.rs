//! Property Price Prediction API Server
//!
//! Serves price estimates from the model produced by the trainer. The model
//! is loaded once at startup and shared read-only by every request.

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use price_model::PricePredictor;
use std::net::SocketAddr;
use std::sync::Arc;
use storage::{ArtifactMetadata, LoadedArtifacts};
use tower_governor::GovernorLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;

pub use config::{LogFormat, LoggingConfig, ServiceConfig};
pub use error::ApiError;
pub use routes::predict::PredictResponse;
pub use routes::status::{HealthResponse, WELCOME_MESSAGE};

/// Application state shared across handlers
pub struct AppState {
    /// Loaded model, `None` while unloaded
    pub predictor: Option<PricePredictor>,
    /// Provenance of the loaded model
    pub metadata: Option<ArtifactMetadata>,
    pub config: ServiceConfig,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus renderer, when a recorder is installed
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// State with no model loaded
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            predictor: None,
            metadata: None,
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics_handle: None,
        }
    }

    /// Serve a model restored from the artifact store
    pub fn with_artifacts(mut self, loaded: LoadedArtifacts) -> Result<Self, ApiError> {
        let LoadedArtifacts { artifact, schema } = loaded;
        let predictor = PricePredictor::new(artifact.model, schema)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        self.predictor = Some(predictor);
        self.metadata = Some(artifact.metadata);
        Ok(self)
    }

    /// Serve an already built predictor
    pub fn with_predictor(mut self, predictor: PricePredictor) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Whether a model is being served
    pub fn is_ready(&self) -> bool {
        self.predictor.is_some()
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut predict = Router::new().route("/predict", post(routes::predict::predict_price));

    let limits = &state.config.server.rate_limit;
    if limits.enabled {
        match rate_limit::create_governor_config(limits) {
            Some(config) => {
                info!(
                    "Rate limiting /predict: burst {} every {}s per IP",
                    limits.burst_size, limits.per_second
                );
                predict = predict.layer(GovernorLayer { config });
            }
            None => warn!("Invalid rate limit settings {:?}, rate limiting disabled", limits),
        }
    }

    Router::new()
        .route("/", get(routes::status::root))
        .route("/health", get(routes::status::health))
        .route("/metrics", get(routes::status::metrics))
        .merge(predict)
        .layer(cors_layer(&state.config.server.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the allowed browser origins. Credentials are allowed, so methods
/// and headers mirror the preflight request instead of using a wildcard.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Plain => builder.init(),
    }
}

/// Install the global Prometheus recorder
pub fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

/// Load artifacts, bind, and serve until the process is stopped
pub async fn run_server(config: ServiceConfig) -> anyhow::Result<()> {
    let mut state = AppState::new(config.clone());

    let store = config.artifact_store();
    match store.load()? {
        Some(loaded) => state = state.with_artifacts(loaded)?,
        None => warn!(
            "No trained model in {}; /predict will answer 503 until one is deployed",
            config.artifacts.dir.display()
        ),
    }

    match install_metrics() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => warn!("Metrics recorder not installed: {}", e),
    }

    let app = create_router(Arc::new(state));
    let addr = config.bind_addr();
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use feature_engine::{log_target, ColumnSchema, FeatureEncoder, PropertyRecord};
    use ndarray::Array1;
    use price_model::{ModelKind, Regressor};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn fitted_predictor() -> PricePredictor {
        let locations = ["Mont Kiara", "Cheras", "Bangsar"];
        let records: Vec<PropertyRecord> = (0..45)
            .map(|i| PropertyRecord {
                area_sqft: 600.0 + 30.0 * i as f64,
                bedrooms: 1 + (i % 4) as u32,
                bathrooms: 1 + (i % 3) as u32,
                location: locations[i % 3].to_string(),
                listing_type: if i % 5 == 0 { "sale" } else { "rent" }.to_string(),
                property_type: "Condominium".to_string(),
            })
            .collect();
        let schema = ColumnSchema::fit(&records);
        let x = FeatureEncoder::new(schema.clone()).encode_batch(&records);
        let y: Array1<f64> = records.iter().map(|r| log_target(r.area_sqft * 4.0)).collect();

        let mut model = ModelKind::Ridge.build(42);
        model.fit(&x, &y).unwrap();
        PricePredictor::new(model, schema).unwrap()
    }

    fn ready_app() -> Router {
        let state = AppState::new(ServiceConfig::default()).with_predictor(fitted_predictor());
        create_router(Arc::new(state))
    }

    fn unloaded_app() -> Router {
        create_router(Arc::new(AppState::new(ServiceConfig::default())))
    }

    fn predict_request(body: String) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn mont_kiara() -> Value {
        json!({
            "area_sqft": 1200,
            "bedrooms": 3,
            "bathrooms": 2,
            "location": "Mont Kiara",
            "listing_type": "rent",
            "property_type": "Condominium"
        })
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_greets() {
        let response = unloaded_app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "message": WELCOME_MESSAGE }));
    }

    #[tokio::test]
    async fn test_predict_without_model_is_unavailable() {
        for body in [mont_kiara().to_string(), "{}".to_string(), "not json".to_string()] {
            let response = unloaded_app().oneshot(predict_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(json_body(response).await, json!({ "detail": "Model is not loaded." }));
        }
    }

    #[tokio::test]
    async fn test_predict_end_to_end() {
        let response = ready_app().oneshot(predict_request(mont_kiara().to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let object = body.as_object().unwrap();
        assert_eq!(object.len(), 1);
        let price = object["predicted_price_myr"].as_f64().unwrap();
        assert!(price > 0.0);
        assert_eq!(price, (price * 100.0).round() / 100.0);
    }

    #[tokio::test]
    async fn test_predict_is_deterministic() {
        let app = ready_app();
        let first = json_body(app.clone().oneshot(predict_request(mont_kiara().to_string())).await.unwrap()).await;
        let second = json_body(app.oneshot(predict_request(mont_kiara().to_string())).await.unwrap()).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_predict_missing_field_is_bad_request() {
        let mut body = mont_kiara();
        body.as_object_mut().unwrap().remove("location");

        let response = ready_app().oneshot(predict_request(body.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let detail = json_body(response).await["detail"].as_str().unwrap().to_string();
        assert!(detail.starts_with("Error processing input: "), "{}", detail);
    }

    #[tokio::test]
    async fn test_predict_rejects_bad_values() {
        for (field, value) in [("bedrooms", json!("three")), ("area_sqft", json!(-10.0))] {
            let mut body = mont_kiara();
            body[field] = value;
            let response = ready_app().oneshot(predict_request(body.to_string())).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "field {}", field);
        }

        let response = ready_app().oneshot(predict_request("{".to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unseen_categories_still_predict() {
        let mut body = mont_kiara();
        body["location"] = json!("Atlantis");
        body["property_type"] = json!("Houseboat");

        let response = ready_app().oneshot(predict_request(body.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_reports_state() {
        let response = unloaded_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["status"], "unloaded");
        assert!(body["model"].is_null());

        let response = ready_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["model"]["name"], "Ridge Regression");
    }

    #[tokio::test]
    async fn test_metrics_without_recorder_is_empty() {
        let response = unloaded_app()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_cors_allows_only_listed_origins() {
        let preflight = |origin: &str| {
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/predict")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap()
        };

        let response = ready_app().oneshot(preflight("http://localhost:3000")).await.unwrap();
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");

        let response = ready_app().oneshot(preflight("http://evil.example")).await.unwrap();
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
