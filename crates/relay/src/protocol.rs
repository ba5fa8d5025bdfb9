// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON messages exchanged with agents over `/ws`.
//!
//! Polls and result reports share one frame shape on the wire and are told
//! apart by `id`: zero asks for work, anything else reports on that job.
//! Frames are decoded into [`Inbound`] so the zero id never leaks past this
//! module.

use serde::{Deserialize, Serialize};

use crate::store::{Job, JobId};

/// Wire value of `id` meaning "no job".
pub const NO_JOB: u64 = 0;

/// Agent -> server frame as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFrame {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub is_success: bool,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub hostname: String,
}

/// Outcome of one job as reported by its agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub id: JobId,
    pub succeeded: bool,
    pub output: String,
    pub hostname: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Ask for the next pending job for `hostname`.
    Poll { hostname: String },
    /// Report a finished job. Never answered.
    Report(JobReport),
}

impl From<AgentFrame> for Inbound {
    fn from(frame: AgentFrame) -> Self {
        match JobId::new(frame.id) {
            None => Self::Poll { hostname: frame.hostname },
            Some(id) => Self::Report(JobReport {
                id,
                succeeded: frame.is_success,
                output: frame.stdout,
                hostname: frame.hostname,
            }),
        }
    }
}

impl Inbound {
    /// Decode a text or binary frame payload.
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice::<AgentFrame>(payload).map(Self::from)
    }
}

/// Server -> agent reply to a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: u64,
    pub context: String,
}

impl Assignment {
    /// Nothing to do right now.
    pub fn none() -> Self {
        Self { id: NO_JOB, context: String::new() }
    }

    pub fn is_none(&self) -> bool {
        self.id == NO_JOB
    }
}

impl From<&Job> for Assignment {
    fn from(job: &Job) -> Self {
        Self { id: job.id.get(), context: job.shell.clone() }
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
