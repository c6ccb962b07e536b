//! Configuration for the ETL pipeline
//!
//! Values come from defaults, then an optional TOML file, then `ELASTIC_*`
//! environment variables.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Index name used when `ELASTIC_INDEX` is unset or empty
pub const DEFAULT_INDEX_NAME: &str = "pdf_data";

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EtlConfig {
    /// Indexing engine connection
    #[serde(default)]
    pub backend: BackendConfig,
    /// Destination index
    #[serde(default)]
    pub index: IndexConfig,
    /// Bulk write batching
    #[serde(default)]
    pub bulk: BulkConfig,
}

impl EtlConfig {
    /// Defaults overlaid with environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load a TOML file, then overlay environment variables
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let mut config: EtlConfig = toml::from_str(&raw).map_err(|e| {
            Error::Config(format!("Invalid config file {}: {}", path.display(), e))
        })?;
        config.apply_env();
        Ok(config)
    }

    /// Overlay `ELASTIC_*` environment variables onto this config
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("ELASTIC_URL") {
            self.backend.url = url;
        }
        if let Some(username) = non_empty("ELASTIC_USERNAME") {
            self.backend.username = username;
        }
        if let Some(password) = non_empty("ELASTIC_PASSWORD") {
            self.backend.password = Some(password);
        }
        if let Some(ca_cert) = non_empty("ELASTIC_CA_CERT") {
            self.backend.ca_cert = Some(PathBuf::from(ca_cert));
        }
        if let Some(verify) = non_empty("ELASTIC_VERIFY_CERTS") {
            match verify.trim().to_lowercase().as_str() {
                "0" | "false" | "no" | "off" => self.backend.verify_certs = false,
                "1" | "true" | "yes" | "on" => self.backend.verify_certs = true,
                other => tracing::warn!("Ignoring ELASTIC_VERIFY_CERTS={}", other),
            }
        }
        if let Some(timeout) = non_empty("ELASTIC_TIMEOUT_SECS") {
            match timeout.trim().parse() {
                Ok(secs) => self.backend.timeout_secs = secs,
                Err(_) => tracing::warn!("Ignoring ELASTIC_TIMEOUT_SECS={}", timeout),
            }
        }
        if let Some(chunk_size) = non_empty("ELASTIC_BULK_CHUNK_SIZE") {
            match chunk_size.trim().parse() {
                Ok(size) => self.bulk.chunk_size = size,
                Err(_) => tracing::warn!("Ignoring ELASTIC_BULK_CHUNK_SIZE={}", chunk_size),
            }
        }
        if let Some(index) = non_empty("ELASTIC_INDEX") {
            self.index.name = index;
        }
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.backend.url.trim().is_empty() {
            return Err(Error::Config("backend.url must not be empty".to_string()));
        }
        if self.backend.timeout_secs == 0 {
            return Err(Error::Config(
                "backend.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.index.name.trim().is_empty() {
            return Err(Error::Config("index.name must not be empty".to_string()));
        }
        if self.bulk.chunk_size == 0 {
            return Err(Error::Config(
                "bulk.chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Indexing engine connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the engine
    pub url: String,
    /// Basic-auth user
    pub username: String,
    /// Basic-auth password
    #[serde(default)]
    pub password: Option<String>,
    /// PEM file with an extra trusted root certificate
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
    /// Verify the server certificate (default: true)
    #[serde(default = "default_verify_certs")]
    pub verify_certs: bool,
    /// Per-request timeout in seconds, applied to schema and bulk calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_verify_certs() -> bool { true }
fn default_timeout_secs() -> u64 { 30 }

impl BackendConfig {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "https://localhost:9200".to_string(),
            username: "elastic".to_string(),
            password: None,
            ca_cert: None,
            verify_certs: true,
            timeout_secs: 30,
        }
    }
}

/// Destination index settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Index name
    pub name: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_INDEX_NAME.to_string(),
        }
    }
}

/// Bulk write batching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Maximum actions per bulk request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Maximum encoded bytes per bulk request
    #[serde(default = "default_max_chunk_bytes")]
    pub max_chunk_bytes: usize,
}

fn default_chunk_size() -> usize { 500 }
fn default_max_chunk_bytes() -> usize { 100 * 1024 * 1024 } // 100MB

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            max_chunk_bytes: 100 * 1024 * 1024,
        }
    }
}
