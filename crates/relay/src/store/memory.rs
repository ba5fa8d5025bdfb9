// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process repository. Hostnames and tags match exactly, as in the MySQL
//! store's binary-collated columns. Nothing survives a restart.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Job, JobId, JobState, JobStore, RecordOutcome, StoreError, TagDirectory};

#[derive(Default)]
struct Inner {
    // Keyed by id so iteration order is insertion order.
    jobs: BTreeMap<JobId, Job>,
    last_id: u64,
    tag_to_host: HashMap<String, String>,
    host_to_tag: HashMap<String, String>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of job rows, in any state.
    pub fn job_count(&self) -> usize {
        self.inner.lock().jobs.len()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_job(&self, hostname: &str, shell: &str) -> Result<JobId, StoreError> {
        let mut inner = self.inner.lock();
        let next = inner.last_id.saturating_add(1);
        let id = JobId::new(next)
            .ok_or_else(|| StoreError::Backend("job id space exhausted".to_owned()))?;
        inner.last_id = next;
        inner.jobs.insert(
            id,
            Job {
                id,
                shell: shell.to_owned(),
                state: JobState::ToSchedule,
                result: String::new(),
                hostname: hostname.to_owned(),
            },
        );
        Ok(id)
    }

    async fn next_pending_job(&self, hostname: &str) -> Result<Option<Job>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .jobs
            .values()
            .find(|job| job.hostname == hostname && job.state == JobState::ToSchedule)
            .cloned())
    }

    async fn record_result(
        &self,
        id: JobId,
        succeeded: bool,
        result: &str,
    ) -> Result<RecordOutcome, StoreError> {
        let mut inner = self.inner.lock();
        let Some(job) = inner.jobs.get_mut(&id) else {
            return Ok(RecordOutcome::UnknownJob);
        };
        if job.state.is_terminal() {
            return Ok(RecordOutcome::AlreadyFinished(job.state));
        }
        job.state = JobState::from_outcome(succeeded);
        job.result = result.to_owned();
        Ok(RecordOutcome::Recorded)
    }

    async fn job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.inner.lock().jobs.get(&id).cloned())
    }
}

#[async_trait]
impl TagDirectory for MemoryStore {
    async fn resolve_tag(&self, tag: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.lock().tag_to_host.get(tag).cloned())
    }

    async fn bind(&self, tag: &str, hostname: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        match (inner.tag_to_host.get(tag), inner.host_to_tag.get(hostname)) {
            (Some(h), Some(t)) if h == hostname && t == tag => return Ok(()),
            (Some(h), _) => {
                return Err(StoreError::Conflict(format!("tag {tag} already bound to {h}")));
            }
            (_, Some(t)) => {
                return Err(StoreError::Conflict(format!("host {hostname} already tagged {t}")));
            }
            (None, None) => {}
        }
        inner.tag_to_host.insert(tag.to_owned(), hostname.to_owned());
        inner.host_to_tag.insert(hostname.to_owned(), tag.to_owned());
        Ok(())
    }
}
