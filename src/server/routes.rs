use crate::server::{handlers, types::AppState};
use crate::service::PriceService;
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn create_router(service: Arc<PriceService>, metrics: PrometheusHandle) -> Router {
    let state = Arc::new(AppState { service, metrics });

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/options", get(handlers::options))
        .route("/predict", post(handlers::predict))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
