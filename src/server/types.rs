use crate::features::{FeatureRecord, SchemaVersion};
use crate::service::PriceService;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::Arc;

/// Shared Application State
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PriceService>,
    pub metrics: PrometheusHandle,
}

// --- DTOs (Data Transfer Objects) ---
// The request body of /predict is `features::CarInput`.

#[derive(Serialize)]
pub struct PredictResponse {
    pub predicted_price: f64,
    pub display: String,
    pub schema: &'static str,
    pub features: FeatureRecord,
    pub inference_time_ms: f64,
}

#[derive(Serialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
    pub default: i32,
}

/// Everything a form needs to render its selection controls.
#[derive(Serialize)]
pub struct OptionsResponse {
    pub brands: &'static [&'static str],
    pub conditions: &'static [&'static str],
    pub fuel_types: &'static [&'static str],
    pub registered_cities: &'static [&'static str],
    pub transaction_types: &'static [&'static str],
    pub years: YearRange,
    pub schema: SchemaVersion,
    pub schema_tag: &'static str,
    pub transaction_type_required: bool,
    pub model_loaded: bool,
}
