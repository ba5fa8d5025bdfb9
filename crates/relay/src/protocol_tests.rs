// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn zero_id_decodes_as_poll() -> anyhow::Result<()> {
    let msg = Inbound::decode(br#"{"id":0,"hostname":"host-a","stdout":"ignored"}"#)?;
    assert_eq!(msg, Inbound::Poll { hostname: "host-a".to_owned() });
    Ok(())
}

#[test]
fn missing_id_decodes_as_poll() -> anyhow::Result<()> {
    let msg = Inbound::decode(br#"{"hostname":"host-a"}"#)?;
    assert_eq!(msg, Inbound::Poll { hostname: "host-a".to_owned() });
    Ok(())
}

#[test]
fn nonzero_id_decodes_as_report() -> anyhow::Result<()> {
    let msg = Inbound::decode(
        br#"{"id":7,"is_success":true,"stdout":"hi\n","hostname":"host-a","extra":1}"#,
    )?;
    let Inbound::Report(report) = msg else {
        anyhow::bail!("expected report, got {msg:?}");
    };
    assert_eq!(report.id.get(), 7);
    assert!(report.succeeded);
    assert_eq!(report.output, "hi\n");
    assert_eq!(report.hostname, "host-a");
    Ok(())
}

#[yare::parameterized(
    not_json = { "hello" },
    negative_id = { r#"{"id":-1}"# },
    string_id = { r#"{"id":"3"}"# },
    array = { "[1,2]" },
)]
fn malformed_frames_fail(payload: &str) {
    assert!(Inbound::decode(payload.as_bytes()).is_err());
}

#[test]
fn empty_assignment_serializes_with_zero_id() -> anyhow::Result<()> {
    let value = serde_json::to_value(Assignment::none())?;
    assert_eq!(value, serde_json::json!({ "id": 0, "context": "" }));
    assert!(Assignment::none().is_none());
    Ok(())
}
