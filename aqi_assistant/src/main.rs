use anyhow::Context;
use aqi_assistant::{api, config::AssistantConfig, llm::AnthropicClient};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cfg = AssistantConfig::load_or_default()?;
    cfg.apply_env();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cfg.source {
        Some(p) => tracing::info!("config loaded from {}", p.display()),
        None => tracing::info!("no config file found; using defaults"),
    }

    let client = AnthropicClient::from_env(&cfg.llm).context("failed to build LLM client")?;
    if !client.has_api_key() {
        tracing::warn!("ANTHROPIC_API_KEY is not set; chat and analyze will fail");
    }
    tracing::info!(model = %cfg.llm.model, "using {}", cfg.llm.base_url);

    let bind_addr = cfg.bind_addr.clone();
    let app = api::router(api::AppState::new(Arc::new(client), cfg));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("listening on {bind_addr}");

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
