// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cmdrelay: dispatches shell commands to polling agents addressed by tag.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod presence;
pub mod protocol;
pub mod state;
pub mod store;
pub mod test_support;
pub mod transport;

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, RelayConfig};
use crate::state::RelayState;
use crate::store::mysql::MySqlStore;
use crate::store::{JobStore, TagDirectory};
use crate::transport::build_router;

/// Initialize tracing/logging from config.
///
/// Uses `try_init` so it's safe to call multiple times (e.g. from tests).
pub fn init_tracing(config: &RelayConfig) {
    use tracing_subscriber::fmt;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match config.log_format {
        LogFormat::Json => fmt::fmt().with_env_filter(filter).json().try_init(),
        LogFormat::Text => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

/// Run the relay server until shutdown.
pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    config.validate()?;

    tracing::info!("connecting to datastore");
    let store = MySqlStore::connect(&config.dsn, config.db_max_connections)
        .await
        .context("connect to datastore")?;
    store.ensure_schema().await.context("prepare schema")?;
    let store = Arc::new(store);

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let jobs: Arc<dyn JobStore> = store.clone();
    let tags: Arc<dyn TagDirectory> = store;
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(RelayState::new(config, jobs, tags, shutdown.clone()));

    let listener = TcpListener::bind(&addr).await.with_context(|| format!("bind {addr}"))?;
    tracing::info!("cmdrelay listening on {addr}");
    let router = build_router(state);
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    tracing::info!("cmdrelay stopped");
    Ok(())
}

/// Cancel `shutdown` on SIGTERM or SIGINT.
fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => {
                tracing::info!("received SIGTERM");
            }
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => {
                tracing::info!("received SIGINT");
            }
        }
        shutdown.cancel();
    });
}
