use anyhow::Context;
use aqi_backend::{
    api,
    config::BackendConfig,
    model::Models,
    store::ReadingStore,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cfg = BackendConfig::load_or_default()?;
    cfg.apply_env();

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cfg.source {
        Some(p) => tracing::info!("config loaded from {}", p.display()),
        None => tracing::info!("no config file found; using defaults"),
    }

    let models = Models::load(&cfg.models.indoor, &cfg.models.outdoor);
    if !models.any_loaded() {
        tracing::warn!("no estimators loaded; device AQI will be used as-is");
    }

    let app = api::router(api::AppState::new(ReadingStore::new(), models));

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;
    tracing::info!("listening on {}", cfg.bind_addr);
    tracing::info!("device push:   POST /api/sensor-data");
    tracing::info!("client poll:   GET  /api/live");
    tracing::info!("prediction:    POST /api/predict");
    tracing::info!("health:        GET  /api/health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
