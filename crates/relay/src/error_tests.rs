// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    unauthorized = { ErrorCode::Unauthorized, StatusCode::UNAUTHORIZED },
    bad_request = { ErrorCode::BadRequest, StatusCode::BAD_REQUEST },
    unknown_tag = { ErrorCode::UnknownTag, StatusCode::BAD_REQUEST },
    internal = { ErrorCode::Internal, StatusCode::INTERNAL_SERVER_ERROR },
)]
fn to_http_response(code: ErrorCode, expected: StatusCode) {
    let (status, Json(body)) = code.to_http_response("test message");
    assert_eq!(status, expected);
    assert_eq!(body.error.code, code.as_str());
    assert_eq!(body.error.message, "test message");
}
