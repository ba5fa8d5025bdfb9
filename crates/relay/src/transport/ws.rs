// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent channel. One task per connected agent, strictly request/response:
//! replies go out in the order their polls arrived.
//!
//! The connection stays open until a read or write fails, the agent closes,
//! a frame cannot be decoded, or the server shuts down. Reconnecting is the
//! agent's job.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};

use crate::protocol::{Assignment, Inbound, JobReport};
use crate::state::RelayState;
use crate::store::RecordOutcome;

/// What the connection loop does after one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Reply(Assignment),
    Continue,
    Close,
}

/// `GET /ws`: WebSocket upgrade for an agent.
pub async fn ws_handler(
    State(state): State<Arc<RelayState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_agent(socket, state))
}

/// Per-connection loop.
async fn handle_agent(socket: WebSocket, state: Arc<RelayState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    tracing::debug!("agent connected");

    loop {
        let msg = tokio::select! {
            _ = state.shutdown.cancelled() => break,
            msg = ws_rx.next() => msg,
        };
        let msg = match msg {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::debug!(err = %e, "agent read failed");
                break;
            }
            None => break,
        };

        match handle_frame(&state, msg).await {
            Step::Reply(assignment) => {
                let text = match serde_json::to_string(&assignment) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::error!(err = %e, "failed to encode assignment");
                        break;
                    }
                };
                if let Err(e) = ws_tx.send(Message::Text(text.into())).await {
                    tracing::debug!(err = %e, "agent write failed");
                    break;
                }
            }
            Step::Continue => {}
            Step::Close => break,
        }
    }

    let _ = ws_tx.close().await;
    tracing::debug!("agent disconnected");
}

/// Handle one frame from an agent.
pub async fn handle_frame(state: &RelayState, msg: Message) -> Step {
    let decoded = match msg {
        Message::Ping(payload) => {
            heartbeat(state, &payload);
            return Step::Continue;
        }
        Message::Pong(_) => return Step::Continue,
        Message::Close(_) => return Step::Close,
        Message::Text(text) => Inbound::decode(text.as_str().as_bytes()),
        Message::Binary(data) => Inbound::decode(&data),
    };

    match decoded {
        Ok(Inbound::Poll { hostname }) => poll(state, &hostname).await,
        Ok(Inbound::Report(report)) => {
            record(state, report).await;
            Step::Continue
        }
        Err(e) => {
            tracing::debug!(err = %e, "malformed agent frame, closing");
            Step::Close
        }
    }
}

/// Ping payload carries the agent's hostname.
fn heartbeat(state: &RelayState, payload: &[u8]) {
    let hostname = String::from_utf8_lossy(payload);
    if hostname.is_empty() {
        return;
    }
    state.presence.touch(&hostname);
}

async fn poll(state: &RelayState, hostname: &str) -> Step {
    match state.jobs.next_pending_job(hostname).await {
        Ok(Some(job)) => {
            tracing::debug!(hostname, job_id = %job.id, "dispatching job");
            Step::Reply(Assignment::from(&job))
        }
        Ok(None) => Step::Reply(Assignment::none()),
        Err(e) => {
            tracing::error!(hostname, err = %e, "poll lookup failed, closing");
            Step::Close
        }
    }
}

async fn record(state: &RelayState, report: JobReport) {
    let JobReport { id, succeeded, output, hostname } = report;
    match state.jobs.record_result(id, succeeded, &output).await {
        Ok(RecordOutcome::Recorded) => {
            tracing::info!(job_id = %id, hostname = %hostname, succeeded, "job finished");
        }
        Ok(RecordOutcome::UnknownJob) => {
            tracing::warn!(job_id = %id, hostname = %hostname, "result for unknown job");
        }
        Ok(RecordOutcome::AlreadyFinished(prev)) => {
            tracing::warn!(job_id = %id, hostname = %hostname, state = %prev, "duplicate result ignored");
        }
        Err(e) => {
            tracing::error!(job_id = %id, hostname = %hostname, err = %e, "failed to record result");
        }
    }
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
