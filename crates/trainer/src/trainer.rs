//! Candidate Training and Selection

use crate::dataset::{filter_outliers, train_test_split, OutlierBounds};
use crate::TrainError;
use data_cleaner::CleanedListing;
use feature_engine::{log_target, restore_target, ColumnSchema, FeatureEncoder, PropertyRecord};
use ndarray::{Array1, Array2, Axis};
use price_model::{ModelKind, RegressionMetrics, Regressor, TrainedModel};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Training job settings
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    /// Candidates to fit, in tie-break order
    pub models: Vec<ModelKind>,
    /// Drop listings outside the quantile band before training
    pub filter_outliers: bool,
    pub lower_quantile: f64,
    pub upper_quantile: f64,
    /// Share of rows held out for evaluation
    pub test_fraction: f64,
    /// Seed for the split and every seeded model
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            models: ModelKind::default_menu(),
            filter_outliers: true,
            lower_quantile: 0.01,
            upper_quantile: 0.99,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Held-out scores for one candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateResult {
    pub kind: ModelKind,
    pub name: String,
    #[serde(flatten)]
    pub metrics: RegressionMetrics,
    pub fit_secs: f64,
}

/// Summary of a training run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub rows_total: usize,
    pub rows_used: usize,
    pub outlier_bounds: Option<OutlierBounds>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub n_features: usize,
    /// Candidates sorted by R², best first
    pub candidates: Vec<CandidateResult>,
    pub best: String,
}

impl TrainingReport {
    /// Log the comparison table
    pub fn log_summary(&self) {
        info!("--- Model Comparison Results ---");
        for c in &self.candidates {
            info!(
                "{:<20} R²={:>8.4}  RMSE={:>12.2}  MAE={:>12.2}  fit={:.2}s",
                c.name, c.metrics.r2, c.metrics.rmse, c.metrics.mae, c.fit_secs
            );
        }
        info!("Best model: {}", self.best);
    }
}

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// The winning model, fitted on the training rows
    pub model: TrainedModel,
    /// Its held-out scores
    pub metrics: RegressionMetrics,
    /// Columns the model was fitted on
    pub schema: ColumnSchema,
    pub report: TrainingReport,
}

/// Runs the filter, split, fit and compare pipeline
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Train every configured candidate and keep the best by held-out R²
    pub fn train(&self, listings: Vec<CleanedListing>) -> Result<TrainingOutcome, TrainError> {
        if self.config.models.is_empty() {
            return Err(TrainError::InsufficientData("no candidate models configured".to_string()));
        }

        let rows_total = listings.len();
        let (listings, outlier_bounds) = if self.config.filter_outliers {
            filter_outliers(listings, self.config.lower_quantile, self.config.upper_quantile)
        } else {
            (listings, None)
        };
        if listings.is_empty() {
            return Err(TrainError::InsufficientData("dataset has no usable rows".to_string()));
        }

        let (records, prices): (Vec<PropertyRecord>, Vec<f64>) =
            listings.into_iter().map(|l| (l.record, l.price)).unzip();

        let schema = ColumnSchema::fit(&records);
        let encoder = FeatureEncoder::new(schema.clone());
        let x = encoder.encode_batch(&records);
        let y: Array1<f64> = prices.iter().map(|&p| log_target(p)).collect();
        info!("Encoded {} rows into {} columns", x.nrows(), x.ncols());

        let split = train_test_split(x.nrows(), self.config.test_fraction, self.config.seed)?;
        let (x_train, y_train) = take_rows(&x, &y, &split.train);
        let (x_test, y_test) = take_rows(&x, &y, &split.test);
        let actual_prices: Vec<f64> = y_test.iter().map(|&v| restore_target(v)).collect();
        info!("Split: {} training rows, {} test rows", split.train.len(), split.test.len());

        let mut fitted: Vec<(TrainedModel, CandidateResult)> = Vec::with_capacity(self.config.models.len());
        for kind in &self.config.models {
            info!("Training {}...", kind);
            let mut model = kind.build(self.config.seed);

            let start = Instant::now();
            model.fit(&x_train, &y_train)?;
            let fit_secs = start.elapsed().as_secs_f64();

            let predicted: Vec<f64> = model.predict(&x_test)?.iter().map(|&v| restore_target(v)).collect();
            let metrics = RegressionMetrics::compute(&actual_prices, &predicted);
            if !metrics.r2.is_finite() {
                warn!("{} produced a non-finite R²", kind);
            }
            debug!("{}: {:?} in {:.3}s", kind, metrics, fit_secs);

            fitted.push((
                model,
                CandidateResult {
                    kind: *kind,
                    name: kind.display_name().to_string(),
                    metrics,
                    fit_secs,
                },
            ));
        }

        let best_idx = select_best(fitted.iter().map(|(_, result)| result.metrics.r2));
        let mut candidates: Vec<CandidateResult> = fitted.iter().map(|(_, r)| r.clone()).collect();
        candidates.sort_by(|a, b| rank(b.metrics.r2).total_cmp(&rank(a.metrics.r2)));

        let (model, best) = fitted.swap_remove(best_idx);
        let report = TrainingReport {
            rows_total,
            rows_used: records.len(),
            outlier_bounds,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
            n_features: schema.len(),
            candidates,
            best: best.name,
        };

        Ok(TrainingOutcome {
            model,
            metrics: best.metrics,
            schema,
            report,
        })
    }
}

/// NaN scores rank below every real score
fn rank(r2: f64) -> f64 {
    if r2.is_nan() {
        f64::NEG_INFINITY
    } else {
        r2
    }
}

/// Index of the highest score; the first wins a tie
fn select_best(scores: impl Iterator<Item = f64>) -> usize {
    let mut best_idx = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (idx, score) in scores.enumerate() {
        let score = rank(score);
        if idx == 0 || score > best_score {
            best_idx = idx;
            best_score = score;
        }
    }
    best_idx
}

fn take_rows(x: &Array2<f64>, y: &Array1<f64>, rows: &[usize]) -> (Array2<f64>, Array1<f64>) {
    (x.select(Axis(0), rows), y.select(Axis(0), rows))
}
