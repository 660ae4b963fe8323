use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::PredictorError;

/// Installs the global tracing subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), PredictorError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| PredictorError::Config(format!("log level '{}': {}", config.level, e)))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer()).try_init(),
    };
    result.map_err(|e| PredictorError::Config(e.to_string()))
}

pub fn install_metrics() -> Result<PrometheusHandle, PredictorError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| PredictorError::Config(format!("metrics recorder: {}", e)))
}

/// Counts one finished `/predict` request by outcome.
pub fn record_outcome(outcome: &'static str) {
    counter!("carprice_requests_total", "outcome" => outcome).increment(1);
}
