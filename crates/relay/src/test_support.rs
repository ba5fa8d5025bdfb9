// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: an in-memory relay, a failing repository,
//! and a live server.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::{LogFormat, RelayConfig};
use crate::state::RelayState;
use crate::store::memory::MemoryStore;
use crate::store::{Job, JobId, JobStore, RecordOutcome, StoreError, TagDirectory};

pub const TEST_TOKEN: &str = "test-secret";

/// Builder for a [`RelayState`] backed by a [`MemoryStore`].
pub struct RelayStateBuilder {
    token: String,
    presence_ttl_secs: u64,
    tags: Vec<(String, String)>,
    shutdown: CancellationToken,
}

impl Default for RelayStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayStateBuilder {
    pub fn new() -> Self {
        Self {
            token: TEST_TOKEN.to_owned(),
            presence_ttl_secs: 30,
            tags: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn token(mut self, t: impl Into<String>) -> Self {
        self.token = t.into();
        self
    }

    pub fn presence_ttl_secs(mut self, secs: u64) -> Self {
        self.presence_ttl_secs = secs;
        self
    }

    /// Bind `tag` to `hostname` before the state is handed out.
    pub fn tag(mut self, tag: impl Into<String>, hostname: impl Into<String>) -> Self {
        self.tags.push((tag.into(), hostname.into()));
        self
    }

    pub fn shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn build(self) -> anyhow::Result<(Arc<RelayState>, Arc<MemoryStore>)> {
        let store = Arc::new(MemoryStore::new());
        let jobs: Arc<dyn JobStore> = store.clone();
        let tags: Arc<dyn TagDirectory> = store.clone();
        let state = self.build_with(jobs, tags).await?;
        Ok((state, store))
    }

    /// Build over caller-supplied repositories. Configured tags are bound in `tags`.
    pub async fn build_with(
        self,
        jobs: Arc<dyn JobStore>,
        tags: Arc<dyn TagDirectory>,
    ) -> anyhow::Result<Arc<RelayState>> {
        for (tag, hostname) in &self.tags {
            tags.bind(tag, hostname).await?;
        }
        let config = RelayConfig {
            host: "127.0.0.1".to_owned(),
            port: 0,
            dsn: "memory".to_owned(),
            token: self.token,
            presence_ttl_secs: self.presence_ttl_secs,
            db_max_connections: 1,
            log_level: "debug".to_owned(),
            log_format: LogFormat::Text,
        };
        Ok(Arc::new(RelayState::new(config, jobs, tags, self.shutdown)))
    }
}

/// Repository whose every call fails with [`StoreError::Backend`].
#[derive(Debug, Default)]
pub struct FailingStore;

impl FailingStore {
    fn fail<T>() -> Result<T, StoreError> {
        Err(StoreError::Backend("connection refused".to_owned()))
    }
}

#[async_trait]
impl JobStore for FailingStore {
    async fn create_job(&self, _hostname: &str, _shell: &str) -> Result<JobId, StoreError> {
        Self::fail()
    }

    async fn next_pending_job(&self, _hostname: &str) -> Result<Option<Job>, StoreError> {
        Self::fail()
    }

    async fn record_result(
        &self,
        _id: JobId,
        _succeeded: bool,
        _result: &str,
    ) -> Result<RecordOutcome, StoreError> {
        Self::fail()
    }

    async fn job(&self, _id: JobId) -> Result<Option<Job>, StoreError> {
        Self::fail()
    }
}

#[async_trait]
impl TagDirectory for FailingStore {
    async fn resolve_tag(&self, _tag: &str) -> Result<Option<String>, StoreError> {
        Self::fail()
    }

    async fn bind(&self, _tag: &str, _hostname: &str) -> Result<(), StoreError> {
        Self::fail()
    }
}

/// Spawn the relay router on a random local port.
///
/// Returns the bound address and a join handle for the server task.
pub async fn spawn_http_server(
    state: Arc<RelayState>,
) -> anyhow::Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
    let shutdown = state.shutdown.clone();
    let router = crate::transport::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await;
    });
    Ok((addr, handle))
}
