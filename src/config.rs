use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::PredictorError;
use crate::features::SchemaVersion;

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ModelConfig {
    /// Path to the exported .onnx artifact
    pub path: String,
    #[serde(default)]
    pub schema: SchemaVersion,
    /// Reject artifacts that carry no `feature_schema` metadata tag
    #[serde(default = "default_strict_metadata")]
    pub strict_metadata: bool,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
    /// Stop the process when the model cannot be loaded at startup
    #[serde(default)]
    pub halt_on_load_failure: bool,
}

impl ModelConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct PricingConfig {
    #[serde(default = "default_reference_year")]
    pub reference_year: i32,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            reference_year: default_reference_year(),
            currency: default_currency(),
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_strict_metadata() -> bool {
    true
}

// Models are refreshed once a day.
fn default_cache_ttl_secs() -> u64 {
    24 * 3600
}

fn default_intra_threads() -> usize {
    1
}

fn default_reference_year() -> i32 {
    2025
}

fn default_currency() -> String {
    "PKR".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    pub fn from_yaml(content: &str) -> Result<Self, PredictorError> {
        serde_yaml::from_str(content).map_err(|e| PredictorError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PredictorError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| PredictorError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }
}
