//! Service Configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `PRICE_SERVICE_*` environment variables. Nested keys use a
//! double underscore, e.g. `PRICE_SERVICE_SERVER__PORT=9000`.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storage::{ArtifactStore, DEFAULT_COLUMNS_FILE, DEFAULT_MODEL_FILE};

/// Default location of the optional config file
pub const DEFAULT_CONFIG_PATH: &str = "config/service.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "PRICE_SERVICE";

/// Top-level service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactsConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed by CORS
    pub allowed_origins: Vec<String>,
    pub rate_limit: RateLimitSettings,
}

/// Per-IP rate limit on `/predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    pub enabled: bool,
    /// Seconds between replenished requests
    pub per_second: u64,
    /// Requests allowed in a burst
    pub burst_size: u32,
}

/// Where the trained model lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    pub dir: PathBuf,
    pub model_file: String,
    pub columns_file: String,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// `plain` or `json`
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                allowed_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ],
                rate_limit: RateLimitSettings {
                    enabled: false,
                    per_second: 1,
                    burst_size: 20,
                },
            },
            artifacts: ArtifactsConfig {
                dir: PathBuf::from("artifacts"),
                model_file: DEFAULT_MODEL_FILE.to_string(),
                columns_file: DEFAULT_COLUMNS_FILE.to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Plain,
            },
        }
    }
}

impl ServiceConfig {
    /// Load from the default file location and the environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load from a specific file (which may be absent) and the environment
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults = Config::try_from(&ServiceConfig::default()).context("Failed to encode defaults")?;
        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Socket address string to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Artifact store described by this configuration
    pub fn artifact_store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.artifacts.dir)
            .with_file_names(&self.artifacts.model_file, &self.artifacts.columns_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.allowed_origins.len(), 2);
        assert!(!config.server.rate_limit.enabled);
        assert_eq!(config.logging.format, LogFormat::Plain);
        assert!(config
            .artifact_store()
            .model_path()
            .ends_with("artifacts/property_price_model.bin"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig::load_from_path(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.host, ServiceConfig::default().server.host);
        assert_eq!(config.artifacts.columns_file, "model_columns.bin");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9100

[server.rate_limit]
enabled = true

[logging]
format = "json"
"#,
        )
        .unwrap();

        let config = ServiceConfig::load_from_path(&path).unwrap();
        assert_eq!(config.server.port, 9100);
        assert!(config.server.rate_limit.enabled);
        assert_eq!(config.server.rate_limit.burst_size, 20);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.server.allowed_origins, ServiceConfig::default().server.allowed_origins);
    }
}
