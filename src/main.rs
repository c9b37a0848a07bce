use std::sync::Arc;

use anyhow::{Context, Result};
use data_insights::api::{AppState, create_router};
use data_insights::ServiceConfig;
use log::info;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServiceConfig::from_env().context("loading service configuration")?;
    let addr = config.listen_addr();

    let router = create_router(Arc::new(AppState::new()), config.max_body_bytes);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Data insights service listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("Data insights service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {e}");
    }
}
