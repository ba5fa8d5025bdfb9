// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job and tag repositories.
//!
//! The relay core only talks to persistence through [`JobStore`] and
//! [`TagDirectory`]. [`mysql::MySqlStore`] backs the production binary;
//! [`memory::MemoryStore`] keeps everything in-process.

pub mod memory;
pub mod mysql;

use std::fmt;
use std::num::NonZeroU64;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identifier of a persisted job. Zero is reserved on the wire as the
/// "no job" marker, so real ids are never zero.
pub type JobId = NonZeroU64;

/// Lifecycle state of a job. Transitions only go `ToSchedule -> Succeeded | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    ToSchedule,
    Succeeded,
    Failed,
}

impl JobState {
    /// Terminal state for a reported outcome.
    pub fn from_outcome(succeeded: bool) -> Self {
        if succeeded {
            Self::Succeeded
        } else {
            Self::Failed
        }
    }

    /// Column value in the `jobs.state` column.
    pub fn code(self) -> i8 {
        match self {
            Self::ToSchedule => 0,
            Self::Succeeded => 1,
            Self::Failed => 2,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(Self::ToSchedule),
            1 => Some(Self::Succeeded),
            2 => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::ToSchedule)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToSchedule => "to_schedule",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One shell command addressed to one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub shell: String,
    pub state: JobState,
    /// Captured output; empty until the job finishes.
    pub result: String,
    pub hostname: String,
}

/// Outcome of [`JobStore::record_result`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The job moved to its terminal state.
    Recorded,
    /// No job with that id exists.
    UnknownJob,
    /// The job had already finished; nothing changed.
    AlreadyFinished(JobState),
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store backend: {0}")]
    Backend(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

/// Persistent job repository.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a job in [`JobState::ToSchedule`] and return its id.
    async fn create_job(&self, hostname: &str, shell: &str) -> Result<JobId, StoreError>;

    /// Earliest-inserted job for `hostname` that is still `ToSchedule`.
    ///
    /// The job is not claimed: until a result arrives, every poll for the
    /// host sees it again (at-least-once delivery).
    async fn next_pending_job(&self, hostname: &str) -> Result<Option<Job>, StoreError>;

    /// Move a pending job to its terminal state and store its output.
    async fn record_result(
        &self,
        id: JobId,
        succeeded: bool,
        result: &str,
    ) -> Result<RecordOutcome, StoreError>;

    async fn job(&self, id: JobId) -> Result<Option<Job>, StoreError>;
}

/// One-to-one mapping between logical tags and hostnames.
#[async_trait]
pub trait TagDirectory: Send + Sync {
    async fn resolve_tag(&self, tag: &str) -> Result<Option<String>, StoreError>;

    /// Bind `tag` to `hostname`. Fails with [`StoreError::Conflict`] when
    /// either side is already bound.
    async fn bind(&self, tag: &str, hostname: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
