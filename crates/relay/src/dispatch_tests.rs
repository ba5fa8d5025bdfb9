// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::memory::MemoryStore;
use crate::store::JobState;

async fn bound_store() -> anyhow::Result<MemoryStore> {
    let store = MemoryStore::new();
    store.bind("web1", "host-a").await?;
    Ok(store)
}

#[tokio::test]
async fn submit_enqueues_for_bound_host() -> anyhow::Result<()> {
    let store = bound_store().await?;
    let id = submit_job(&store, &store, "web1", "echo hi").await?;

    let job = store.job(id).await?.ok_or_else(|| anyhow::anyhow!("job missing"))?;
    assert_eq!(job.state, JobState::ToSchedule);
    assert_eq!(job.hostname, "host-a");
    assert_eq!(job.shell, "echo hi");
    Ok(())
}

#[tokio::test]
async fn unknown_tag_creates_nothing() -> anyhow::Result<()> {
    let store = bound_store().await?;
    let err = submit_job(&store, &store, "nope", "echo hi").await;
    assert!(matches!(err, Err(DispatchError::UnknownTag(ref t)) if t == "nope"));
    assert_eq!(store.job_count(), 0);
    Ok(())
}

#[yare::parameterized(
    empty_tag = { "", "echo hi" },
    empty_command = { "web1", "" },
    blank_command = { "web1", "  \n" },
)]
#[test_macro(tokio::test)]
async fn invalid_input_is_rejected(tag: &str, shell: &str) {
    let store = MemoryStore::new();
    let err = submit_job(&store, &store, tag, shell).await;
    assert!(matches!(err, Err(DispatchError::Validation(_))));
    assert_eq!(store.job_count(), 0);
}

#[yare::parameterized(
    validation = { DispatchError::Validation("x"), ErrorCode::BadRequest },
    unknown_tag = { DispatchError::UnknownTag("t".to_owned()), ErrorCode::UnknownTag },
    store = { DispatchError::Store(StoreError::Backend("down".to_owned())), ErrorCode::Internal },
)]
fn error_codes(err: DispatchError, expected: ErrorCode) {
    assert_eq!(err.code(), expected);
}
