//! `parceld`: courier dispatch service binary.
//!
//! Wires pool -> stores -> engine/monitor -> router, then runs the HTTP
//! server and the deadline monitor side by side until a shutdown signal.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use parcel_core::error::DispatchError;
use parcel_core::{AssignEngine, CourierService, DeadlineMonitor, TransportLeasePolicy};
use parcel_server::handlers::AppState;
use parcel_server::{build_router, Config};
use parcel_store::{ensure_schema, PgCourierStore, PgDeliveryStore, PgTxScope};

/// Cancelled on SIGINT or SIGTERM; both the HTTP server and the monitor
/// drain against this token.
fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let handler_token = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm = match tokio::signal::unix::signal(
                tokio::signal::unix::SignalKind::terminate(),
            ) {
                Ok(sigterm) => sigterm,
                Err(err) => {
                    tracing::error!(error = %err, "failed to install SIGTERM handler");
                    return;
                }
            };
            tokio::select! {
                _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
                _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            tracing::info!("received ctrl-c, shutting down");
        }
        handler_token.cancel();
    });

    token
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    ensure_schema(&pool).await.context("ensure schema")?;

    let scope = PgTxScope::new(pool);
    let engine = Arc::new(AssignEngine::new(
        scope.clone(),
        PgCourierStore::new(),
        PgDeliveryStore::new(),
        TransportLeasePolicy::new(),
    ));
    let couriers = Arc::new(CourierService::new(scope.clone(), PgCourierStore::new()));
    let monitor = DeadlineMonitor::new(
        scope,
        PgCourierStore::new(),
        PgDeliveryStore::new(),
        config.monitor_interval,
    );

    let shutdown = install_shutdown_handler();
    let monitor_handle = tokio::spawn(monitor.run(shutdown.clone()));

    let app = build_router(AppState { engine, couriers });
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "parceld listening");

    let server_shutdown = shutdown.clone();
    let server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
            .await
    };

    tokio::select! {
        result = server => {
            result.context("http server")?;
        }
        result = monitor_handle => {
            match result {
                Ok(Ok(())) | Ok(Err(DispatchError::Cancelled)) => {}
                Ok(Err(err)) => return Err(err).context("deadline monitor"),
                Err(join_err) => return Err(join_err).context("deadline monitor task"),
            }
        }
    }

    tracing::info!("parceld stopped");
    Ok(())
}
