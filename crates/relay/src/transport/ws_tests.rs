// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::body::Bytes;

use super::*;
use crate::store::{JobState, JobStore};
use crate::test_support::{FailingStore, RelayStateBuilder};

async fn failing_state() -> anyhow::Result<Arc<RelayState>> {
    let store = Arc::new(FailingStore);
    RelayStateBuilder::new().build_with(store.clone(), store).await
}

fn text(value: serde_json::Value) -> Message {
    Message::Text(value.to_string().into())
}

#[tokio::test]
async fn poll_without_work_replies_none() -> anyhow::Result<()> {
    let (state, _store) = RelayStateBuilder::new().build().await?;
    let step = handle_frame(&state, text(serde_json::json!({ "id": 0, "hostname": "host-a" }))).await;
    assert_eq!(step, Step::Reply(Assignment::none()));
    Ok(())
}

#[tokio::test]
async fn poll_returns_pending_job() -> anyhow::Result<()> {
    let (state, store) = RelayStateBuilder::new().build().await?;
    let id = store.create_job("host-a", "echo hi").await?;

    let step = handle_frame(&state, text(serde_json::json!({ "id": 0, "hostname": "host-a" }))).await;
    assert_eq!(step, Step::Reply(Assignment { id: id.get(), context: "echo hi".to_owned() }));

    // Other hosts see nothing.
    let step = handle_frame(&state, text(serde_json::json!({ "id": 0, "hostname": "host-b" }))).await;
    assert_eq!(step, Step::Reply(Assignment::none()));
    Ok(())
}

#[tokio::test]
async fn report_records_result_without_reply() -> anyhow::Result<()> {
    let (state, store) = RelayStateBuilder::new().build().await?;
    let id = store.create_job("host-a", "echo hi").await?;

    let report = serde_json::json!({
        "id": id.get(),
        "is_success": true,
        "stdout": "hi\n",
        "hostname": "host-a",
    });
    assert_eq!(handle_frame(&state, text(report)).await, Step::Continue);

    let job = store.job(id).await?.ok_or_else(|| anyhow::anyhow!("job missing"))?;
    assert_eq!(job.state, JobState::Succeeded);
    assert_eq!(job.result, "hi\n");
    Ok(())
}

#[tokio::test]
async fn report_for_unknown_job_keeps_connection() -> anyhow::Result<()> {
    let (state, store) = RelayStateBuilder::new().build().await?;
    let report = serde_json::json!({ "id": 99, "is_success": false, "stdout": "", "hostname": "h" });
    assert_eq!(handle_frame(&state, text(report)).await, Step::Continue);
    assert_eq!(store.job_count(), 0);
    Ok(())
}

#[tokio::test]
async fn binary_frames_are_accepted() -> anyhow::Result<()> {
    let (state, _store) = RelayStateBuilder::new().build().await?;
    let frame = Message::Binary(Bytes::from_static(br#"{"id":0,"hostname":"host-a"}"#));
    assert_eq!(handle_frame(&state, frame).await, Step::Reply(Assignment::none()));
    Ok(())
}

#[tokio::test]
async fn ping_touches_presence() -> anyhow::Result<()> {
    let (state, _store) = RelayStateBuilder::new().build().await?;
    let step = handle_frame(&state, Message::Ping(Bytes::from_static(b"host-a"))).await;
    assert_eq!(step, Step::Continue);
    assert!(state.presence.snapshot(state.config.presence_ttl()).contains_key("host-a"));
    Ok(())
}

#[tokio::test]
async fn empty_ping_is_ignored() -> anyhow::Result<()> {
    let (state, _store) = RelayStateBuilder::new().build().await?;
    let step = handle_frame(&state, Message::Ping(Bytes::new())).await;
    assert_eq!(step, Step::Continue);
    assert!(state.presence.is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_frame_closes() -> anyhow::Result<()> {
    let (state, _store) = RelayStateBuilder::new().build().await?;
    assert_eq!(handle_frame(&state, Message::Text("not json".to_owned().into())).await, Step::Close);
    assert_eq!(handle_frame(&state, Message::Close(None)).await, Step::Close);
    Ok(())
}

#[tokio::test]
async fn store_failure_on_poll_closes() -> anyhow::Result<()> {
    let state = failing_state().await?;
    let step = handle_frame(&state, text(serde_json::json!({ "id": 0, "hostname": "host-a" }))).await;
    assert_eq!(step, Step::Close);
    Ok(())
}

#[tokio::test]
async fn store_failure_on_report_keeps_connection() -> anyhow::Result<()> {
    let state = failing_state().await?;
    let report = serde_json::json!({ "id": 5, "is_success": true, "stdout": "ok", "hostname": "host-a" });
    assert_eq!(handle_frame(&state, text(report)).await, Step::Continue);

    // Still answers afterwards on the same connection state.
    let ping = handle_frame(&state, Message::Ping(Bytes::from_static(b"host-a"))).await;
    assert_eq!(ping, Step::Continue);
    Ok(())
}
