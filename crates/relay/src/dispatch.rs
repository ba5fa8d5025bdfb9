// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns a tag-addressed command into a pending job.
//!
//! Submission only enqueues. Open agent connections are not notified; the
//! job is picked up on the agent's next poll.

use crate::error::ErrorCode;
use crate::store::{JobId, JobStore, StoreError, TagDirectory};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid request: {0}")]
    Validation(&'static str),
    #[error("tag not found: {0}")]
    UnknownTag(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DispatchError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::BadRequest,
            Self::UnknownTag(_) => ErrorCode::UnknownTag,
            Self::Store(_) => ErrorCode::Internal,
        }
    }
}

/// Resolve `tag` to its host and enqueue `shell` for it.
pub async fn submit_job(
    tags: &dyn TagDirectory,
    jobs: &dyn JobStore,
    tag: &str,
    shell: &str,
) -> Result<JobId, DispatchError> {
    if tag.is_empty() {
        return Err(DispatchError::Validation("missing tag"));
    }
    if shell.trim().is_empty() {
        return Err(DispatchError::Validation("missing command"));
    }

    let hostname =
        tags.resolve_tag(tag).await?.ok_or_else(|| DispatchError::UnknownTag(tag.to_owned()))?;
    let id = jobs.create_job(&hostname, shell).await?;
    tracing::info!(job_id = %id, tag, hostname = %hostname, "job enqueued");
    Ok(id)
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
