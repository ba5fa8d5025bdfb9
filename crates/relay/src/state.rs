// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::presence::PresenceRegistry;
use crate::store::{JobStore, TagDirectory};

/// Shared relay state.
pub struct RelayState {
    pub config: RelayConfig,
    pub jobs: Arc<dyn JobStore>,
    pub tags: Arc<dyn TagDirectory>,
    /// Only in-process shared mutable structure; see [`PresenceRegistry`].
    pub presence: PresenceRegistry,
    pub shutdown: CancellationToken,
}

impl RelayState {
    pub fn new(
        config: RelayConfig,
        jobs: Arc<dyn JobStore>,
        tags: Arc<dyn TagDirectory>,
        shutdown: CancellationToken,
    ) -> Self {
        Self { config, jobs, tags, presence: PresenceRegistry::new(), shutdown }
    }
}
