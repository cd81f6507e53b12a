use anyhow::Context;

use fintrack_api::app::{build_app, build_services};
use fintrack_api::config::AppConfig;

#[tokio::main]
async fn main() {
    fintrack_observability::init();

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fintrack-api failed to start");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let services = build_services(&config).await?;
    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
        Err(err) => {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
