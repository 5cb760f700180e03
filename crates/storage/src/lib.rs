//! Storage Layer
//!
//! Persists the trained model and its column schema as postcard blobs and
//! restores them for serving.

mod artifact;

pub use artifact::{
    ArtifactMetadata, ArtifactStore, LoadedArtifacts, ModelArtifact, DEFAULT_COLUMNS_FILE,
    DEFAULT_MODEL_FILE,
};

use std::path::PathBuf;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error in {}: {message}", .path.display())]
    SerializationError { path: PathBuf, message: String },
    #[error("Model was trained on {model} features but the stored schema has {schema} columns")]
    SchemaMismatch { model: usize, schema: usize },
    #[error("Stored model is not fitted")]
    Unfitted,
}
