// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MySQL-backed repository.
//!
//! Hostname and tag columns use a binary collation so lookups are exact and
//! case-sensitive, matching [`super::memory::MemoryStore`].

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::{MySqlPool, Row};

use super::{Job, JobId, JobState, JobStore, RecordOutcome, StoreError, TagDirectory};

const CREATE_JOBS: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
    shell TEXT NOT NULL,
    state TINYINT NOT NULL DEFAULT 0,
    result LONGTEXT NULL,
    hostname VARCHAR(255) CHARACTER SET utf8mb4 COLLATE utf8mb4_bin NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
    INDEX idx_query (hostname, state)
)
"#;

const CREATE_TAG_BINDINGS: &str = r#"
CREATE TABLE IF NOT EXISTS tag_bindings (
    id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
    hostname VARCHAR(255) CHARACTER SET utf8mb4 COLLATE utf8mb4_bin NOT NULL UNIQUE,
    tag VARCHAR(255) CHARACTER SET utf8mb4 COLLATE utf8mb4_bin NOT NULL UNIQUE,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)
"#;

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub async fn connect(dsn: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(dsn)
            .await?;
        Ok(Self { pool })
    }

    /// Create the `jobs` and `tag_bindings` tables if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_JOBS).execute(&self.pool).await?;
        sqlx::query(CREATE_TAG_BINDINGS).execute(&self.pool).await?;
        Ok(())
    }
}

fn job_from_row(row: &MySqlRow) -> Result<Job, StoreError> {
    let raw_id: u64 = row.try_get("id")?;
    let id = JobId::new(raw_id)
        .ok_or_else(|| StoreError::Backend("job row with id 0".to_owned()))?;
    let code: i8 = row.try_get("state")?;
    let state = JobState::from_code(code)
        .ok_or_else(|| StoreError::Backend(format!("job {id} has unknown state {code}")))?;
    let result: Option<String> = row.try_get("result")?;
    Ok(Job {
        id,
        shell: row.try_get("shell")?,
        state,
        result: result.unwrap_or_default(),
        hostname: row.try_get("hostname")?,
    })
}

#[async_trait]
impl JobStore for MySqlStore {
    async fn create_job(&self, hostname: &str, shell: &str) -> Result<JobId, StoreError> {
        let done = sqlx::query("INSERT INTO jobs (shell, state, result, hostname) VALUES (?, ?, '', ?)")
            .bind(shell)
            .bind(JobState::ToSchedule.code())
            .bind(hostname)
            .execute(&self.pool)
            .await?;
        JobId::new(done.last_insert_id())
            .ok_or_else(|| StoreError::Backend("insert returned id 0".to_owned()))
    }

    async fn next_pending_job(&self, hostname: &str) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, shell, state, result, hostname
            FROM jobs
            WHERE hostname = ? AND state = ?
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(hostname)
        .bind(JobState::ToSchedule.code())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(job_from_row).transpose()
    }

    async fn record_result(
        &self,
        id: JobId,
        succeeded: bool,
        result: &str,
    ) -> Result<RecordOutcome, StoreError> {
        let done = sqlx::query("UPDATE jobs SET state = ?, result = ? WHERE id = ? AND state = ?")
            .bind(JobState::from_outcome(succeeded).code())
            .bind(result)
            .bind(id.get())
            .bind(JobState::ToSchedule.code())
            .execute(&self.pool)
            .await?;
        if done.rows_affected() > 0 {
            return Ok(RecordOutcome::Recorded);
        }

        Ok(match self.job(id).await? {
            Some(job) => RecordOutcome::AlreadyFinished(job.state),
            None => RecordOutcome::UnknownJob,
        })
    }

    async fn job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query("SELECT id, shell, state, result, hostname FROM jobs WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(job_from_row).transpose()
    }
}

#[async_trait]
impl TagDirectory for MySqlStore {
    async fn resolve_tag(&self, tag: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT hostname FROM tag_bindings WHERE tag = ?")
            .bind(tag)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_get::<String, _>("hostname")).transpose().map_err(StoreError::from)
    }

    async fn bind(&self, tag: &str, hostname: &str) -> Result<(), StoreError> {
        if self.resolve_tag(tag).await?.as_deref() == Some(hostname) {
            return Ok(());
        }

        let res = sqlx::query("INSERT INTO tag_bindings (hostname, tag) VALUES (?, ?)")
            .bind(hostname)
            .bind(tag)
            .execute(&self.pool)
            .await;
        match res {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(StoreError::Conflict(
                format!("tag {tag} or host {hostname} already bound"),
            )),
            Err(e) => Err(e.into()),
        }
    }
}
