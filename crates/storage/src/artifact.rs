//! Model Artifact Store

use crate::StorageError;
use chrono::{DateTime, Utc};
use feature_engine::ColumnSchema;
use price_model::{RegressionMetrics, Regressor, TrainedModel};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default file name of the model blob
pub const DEFAULT_MODEL_FILE: &str = "property_price_model.bin";
/// Default file name of the column schema blob
pub const DEFAULT_COLUMNS_FILE: &str = "model_columns.bin";

/// Provenance of a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Unique id of the training run
    pub run_id: Uuid,
    /// When training finished
    pub trained_at: DateTime<Utc>,
    /// Human-readable model name
    pub model_name: String,
    /// Feature width the model was fitted on
    pub n_features: usize,
    /// Held-out R²
    pub r2: f64,
    /// Held-out RMSE
    pub rmse: f64,
    /// Held-out MAE
    pub mae: f64,
}

/// The persisted model blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ArtifactMetadata,
    pub model: TrainedModel,
}

impl ModelArtifact {
    /// Wrap a freshly selected model with new run metadata.
    ///
    /// Fails if the model has not been fitted.
    pub fn new(model: TrainedModel, metrics: RegressionMetrics) -> Result<Self, StorageError> {
        let n_features = model.n_features().ok_or(StorageError::Unfitted)?;
        Ok(Self {
            metadata: ArtifactMetadata {
                run_id: Uuid::new_v4(),
                trained_at: Utc::now(),
                model_name: model.name().to_string(),
                n_features,
                r2: metrics.r2,
                rmse: metrics.rmse,
                mae: metrics.mae,
            },
            model,
        })
    }
}

/// Artifacts restored from disk, checked for consistency
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub artifact: ModelArtifact,
    pub schema: ColumnSchema,
}

/// Reads and writes the model and schema blobs in one directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    model_file: String,
    columns_file: String,
}

impl ArtifactStore {
    /// Store rooted at `dir` with the default file names
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            model_file: DEFAULT_MODEL_FILE.to_string(),
            columns_file: DEFAULT_COLUMNS_FILE.to_string(),
        }
    }

    /// Override the blob file names
    pub fn with_file_names(mut self, model_file: impl Into<String>, columns_file: impl Into<String>) -> Self {
        self.model_file = model_file.into();
        self.columns_file = columns_file.into();
        self
    }

    /// Path of the model blob
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    /// Path of the column schema blob
    pub fn columns_path(&self) -> PathBuf {
        self.dir.join(&self.columns_file)
    }

    /// Write both blobs, creating the directory if needed
    pub fn save(&self, artifact: &ModelArtifact, schema: &ColumnSchema) -> Result<(), StorageError> {
        check_consistency(artifact, schema)?;

        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;
        write_blob(&self.model_path(), artifact)?;
        write_blob(&self.columns_path(), schema)?;

        info!(
            "Saved {} (run {}) and {} columns to {}",
            artifact.metadata.model_name,
            artifact.metadata.run_id,
            schema.len(),
            self.dir.display()
        );
        Ok(())
    }

    /// Restore both blobs.
    ///
    /// Returns `Ok(None)` when either file is absent. Corrupt blobs or a model
    /// whose width disagrees with the schema are errors.
    pub fn load(&self) -> Result<Option<LoadedArtifacts>, StorageError> {
        let model_path = self.model_path();
        let columns_path = self.columns_path();

        for path in [&model_path, &columns_path] {
            if !path.exists() {
                warn!("Artifact {} not found", path.display());
                return Ok(None);
            }
        }

        let artifact: ModelArtifact = read_blob(&model_path)?;
        let schema: ColumnSchema = read_blob(&columns_path)?;
        check_consistency(&artifact, &schema)?;

        info!(
            "Loaded {} (run {}, trained {}, R² {:.4}) with {} columns",
            artifact.metadata.model_name,
            artifact.metadata.run_id,
            artifact.metadata.trained_at.to_rfc3339(),
            artifact.metadata.r2,
            schema.len()
        );
        Ok(Some(LoadedArtifacts { artifact, schema }))
    }
}

fn check_consistency(artifact: &ModelArtifact, schema: &ColumnSchema) -> Result<(), StorageError> {
    let model_width = artifact.model.n_features().ok_or(StorageError::Unfitted)?;
    if model_width != schema.len() {
        return Err(StorageError::SchemaMismatch {
            model: model_width,
            schema: schema.len(),
        });
    }
    Ok(())
}

fn write_blob<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let bytes = postcard::to_allocvec(value).map_err(|e| StorageError::SerializationError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    fs::write(path, &bytes).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

fn read_blob<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let bytes = fs::read(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    postcard::from_bytes(&bytes).map_err(|e| StorageError::SerializationError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
