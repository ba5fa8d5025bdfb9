// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for operators.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::{Form, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatch::{self, DispatchError};
use crate::state::RelayState;
use crate::transport::auth;

/// Body returned by a successful submission.
pub const SUBMIT_ACK: &str = "get it";

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// Agents inside the presence window; same rule as `GET /online`.
    pub online: usize,
}

/// Submit-job parameters, from an urlencoded body or the query string.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitRequest {
    /// Tag of the target agent.
    #[serde(default)]
    pub ecs: String,
    #[serde(default)]
    pub cmd: String,
    #[serde(default)]
    pub token: String,
}

impl SubmitRequest {
    /// Body fields win; empty body fields fall back to the query string.
    fn or(self, fallback: Self) -> Self {
        fn pick(a: String, b: String) -> String {
            if a.is_empty() {
                b
            } else {
                a
            }
        }
        Self {
            ecs: pick(self.ecs, fallback.ecs),
            cmd: pick(self.cmd, fallback.cmd),
            token: pick(self.token, fallback.token),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OnlineResponse {
    pub count: usize,
    /// Hostname -> last heartbeat, as an RFC 3339 timestamp.
    pub list: BTreeMap<String, DateTime<Utc>>,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<RelayState>>) -> impl IntoResponse {
    let online = s.presence.online_count(s.config.presence_ttl());
    Json(HealthResponse { status: "running".to_owned(), online })
}

/// `POST /cmd`: enqueue a shell command for the agent bound to a tag.
pub async fn submit_job(
    State(s): State<Arc<RelayState>>,
    Query(query): Query<SubmitRequest>,
    form: Result<Form<SubmitRequest>, FormRejection>,
) -> axum::response::Response {
    let req = match form {
        Ok(Form(body)) => body.or(query),
        Err(e) => {
            tracing::debug!(err = %e, "no usable form body, using query string");
            query
        }
    };

    if let Err(code) = auth::validate_token(&req.token, &s.config.token) {
        tracing::warn!(tag = %req.ecs, "job submission with bad token");
        return code.to_http_response("unauthorized").into_response();
    }

    match dispatch::submit_job(s.tags.as_ref(), s.jobs.as_ref(), &req.ecs, &req.cmd).await {
        Ok(_) => SUBMIT_ACK.into_response(),
        Err(e) => {
            if let DispatchError::Store(ref inner) = e {
                tracing::error!(tag = %req.ecs, err = %inner, "failed to enqueue job");
            }
            e.code().to_http_response(e.to_string()).into_response()
        }
    }
}

/// `GET /online`: agents with a heartbeat inside the presence window.
///
/// Evicts stale entries as a side effect.
pub async fn online(State(s): State<Arc<RelayState>>) -> impl IntoResponse {
    let list = s.presence.snapshot(s.config.presence_ttl());
    Json(OnlineResponse { count: list.len(), list })
}
