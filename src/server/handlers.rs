use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

use crate::catalog;
use crate::error::PredictorError;
use crate::features::CarInput;
use crate::server::types::*;
use crate::telemetry::record_outcome;

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn options(State(state): State<Arc<AppState>>) -> Json<OptionsResponse> {
    let schema = state.service.schema();

    Json(OptionsResponse {
        brands: catalog::BRANDS,
        conditions: catalog::CONDITIONS,
        fuel_types: catalog::FUEL_TYPES,
        registered_cities: catalog::REGISTERED_CITIES,
        transaction_types: catalog::TRANSACTION_TYPES,
        years: YearRange {
            min: catalog::MIN_YEAR,
            max: catalog::MAX_YEAR,
            default: catalog::DEFAULT_YEAR,
        },
        schema: schema.version(),
        schema_tag: schema.tag(),
        transaction_type_required: schema.requires_transaction_type(),
        model_loaded: state.service.model_loaded(),
    })
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CarInput>, JsonRejection>,
) -> Result<Json<PredictResponse>, PredictorError> {
    let start = Instant::now();

    let result = match payload {
        // Model loading and ONNX inference both block.
        Ok(Json(input)) => {
            let service = state.service.clone();
            tokio::task::spawn_blocking(move || service.quote(&input))
                .await
                .map_err(|e| PredictorError::Inference(format!("prediction task failed: {}", e)))
                .and_then(|quote| quote)
        }
        Err(rejection) => Err(PredictorError::Validation(rejection.body_text())),
    };

    let quote = match result {
        Ok(quote) => {
            record_outcome("ok");
            quote
        }
        Err(e) if e.is_validation() => {
            warn!(error = %e, "Rejected submission");
            record_outcome("validation");
            return Err(e);
        }
        Err(e) => {
            error!(error = %e, "Prediction failed");
            record_outcome("error");
            return Err(e);
        }
    };

    Ok(Json(PredictResponse {
        predicted_price: quote.predicted_price,
        display: quote.display,
        schema: quote.schema,
        features: quote.features,
        inference_time_ms: start.elapsed().as_secs_f64() * 1000.0,
    }))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics.render()
}
