use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::app::{router, AppState};
use crate::auth::spawn_session_sweeper;
use crate::config;
use crate::database::{schema::ensure_schema, DatabaseManager, MemoryGateway, PgGateway};
use crate::metrics::{spawn_flusher, MetricsRegistry};

pub async fn handle(port: Option<u16>, in_memory: bool) -> anyhow::Result<()> {
    let mut config = config::config().clone();
    config.validate()?;
    if let Some(port) = port {
        config.api.port = port;
    }
    info!("Starting JWT Pizza Service in {:?} mode", config.environment);

    let registry = Arc::new(
        MetricsRegistry::new(config.metrics.source.clone()).context("failed to register metrics")?,
    );
    spawn_flusher(registry.clone(), Duration::from_secs(config.metrics.flush_interval_secs));

    let port = config.api.port;
    let sweep_interval = Duration::from_secs(config.security.session_sweep_interval_secs);

    let state = if in_memory {
        info!("Using in-memory gateway; data is lost on exit");
        AppState::new(Arc::new(MemoryGateway::new()), registry, config)?
    } else {
        let pool = DatabaseManager::connect(&config.database)
            .await
            .context("failed to connect to the database")?;
        ensure_schema(&pool).await?;
        AppState::new(Arc::new(PgGateway::new(pool)), registry, config)?
    };

    spawn_session_sweeper(state.tokens.clone(), state.metrics.clone(), sweep_interval);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("JWT Pizza Service listening on http://{}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
