//! # efile-api: Binary Entry Point
//!
//! Parses configuration, opens the database when one is configured, and
//! serves the API until Ctrl-C.

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use efile_api::config::Cli;
use efile_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = cli.app_config();
    if config.auth_config().token.is_none() {
        tracing::warn!("AUTH_TOKEN not set; authentication is disabled and every caller is admin");
    }

    let state = match &cli.database_url {
        Some(url) => {
            let pool = efile_api::db::init_pool(url, cli.max_connections)
                .await
                .context("database initialization failed")?;
            AppState::with_pool(config, pool)?
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set; running in-memory only. State will not survive restarts."
            );
            AppState::in_memory(config)?
        }
    };
    let pool = state.db_pool.clone();

    let app = efile_api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "efile-api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("database pool closed");
    }
    tracing::info!("shutdown complete");

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
