use anyhow::Context;
use carprice::{
    config::AppConfig,
    features::FeatureSchema,
    model::{self, loader::LoadOptions, ModelCache, PricePredictor},
    server,
    service::PriceService,
    telemetry,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load Config
    let config_path =
        std::env::var("CARPRICE_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    // 2. Init
    telemetry::init_tracing(&config.logging)?;
    let metrics = telemetry::install_metrics()?;
    model::loader::init_ort()?;

    // 3. Model handle
    let schema = FeatureSchema::for_version(config.model.schema);
    let options = LoadOptions {
        strict_metadata: config.model.strict_metadata,
        intra_threads: config.model.intra_threads,
    };
    let model_path = config.model.path.clone();
    let cache = ModelCache::new(config.model.cache_ttl(), move || {
        let predictor = model::loader::load_model(&model_path, schema, options)?;
        Ok(Arc::new(predictor) as Arc<dyn PricePredictor>)
    });
    let service = Arc::new(PriceService::new(cache, schema, &config.pricing));

    info!(
        path = %config.model.path,
        schema = schema.tag(),
        ttl_secs = config.model.cache_ttl_secs,
        "Loading price model"
    );
    match service.warm_up() {
        Ok(()) => {}
        Err(e) if config.model.halt_on_load_failure => {
            return Err(anyhow::Error::new(e).context("Failed to load model"));
        }
        Err(e) => warn!(error = %e, "Model not loaded; will retry on the next prediction"),
    }

    // 4. Create Router
    let app = server::routes::create_router(service, metrics);

    // 5. Bind & Serve
    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
        .await
        .context("Failed to bind listener")?;
    info!(
        "Server listening on http://{}:{}",
        config.server.host, config.server.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
