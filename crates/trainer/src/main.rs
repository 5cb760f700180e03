//! Price Model Trainer - Command Line Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use data_cleaner::read_cleaned_listings;
use price_model::ModelKind;
use std::fs::File;
use std::path::PathBuf;
use storage::{ArtifactStore, ModelArtifact};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use trainer::{TrainError, Trainer, TrainingConfig};

#[derive(Parser)]
#[command(name = "train-model")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train candidate price models and persist the best one", long_about = None)]
struct Cli {
    /// Cleaned listings dataset
    #[arg(long, default_value = "properties_cleaned.csv")]
    data: PathBuf,

    /// Directory the model and column schema are written to
    #[arg(long, default_value = "artifacts")]
    artifacts: PathBuf,

    /// Candidate models, comma separated
    #[arg(long, value_delimiter = ',')]
    models: Option<Vec<ModelKind>>,

    /// Train on every row, including price outliers
    #[arg(long)]
    no_outlier_filter: bool,

    /// Seed for the split and seeded models
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Write the comparison report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!("Loading cleaned data from {}", cli.data.display());

    let listings = match read_cleaned_listings(&cli.data).map_err(TrainError::from) {
        Ok(listings) => listings,
        Err(e @ TrainError::MissingInput(_)) => {
            error!("{}. Run clean-listings first.", e);
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to read cleaned dataset"),
    };

    let config = TrainingConfig {
        models: cli.models.unwrap_or_else(ModelKind::default_menu),
        filter_outliers: !cli.no_outlier_filter,
        seed: cli.seed,
        ..Default::default()
    };
    let outcome = Trainer::new(config).train(listings).context("Training failed")?;
    outcome.report.log_summary();

    let artifact = ModelArtifact::new(outcome.model, outcome.metrics)?;
    let store = ArtifactStore::new(&cli.artifacts);
    store
        .save(&artifact, &outcome.schema)
        .with_context(|| format!("Failed to save artifacts to {}", cli.artifacts.display()))?;

    if let Some(path) = &cli.report {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, &outcome.report).context("Failed to write report")?;
        info!("Report written to {}", path.display());
    }

    info!(
        "Best model '{}' saved to {} and {}",
        artifact.metadata.model_name,
        store.model_path().display(),
        store.columns_path().display()
    );
    Ok(())
}
