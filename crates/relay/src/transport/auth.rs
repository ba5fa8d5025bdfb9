// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::ErrorCode;

/// Constant-time string comparison to prevent timing side-channel attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

/// Check a submitted shared secret against the configured one.
pub fn validate_token(provided: &str, expected: &str) -> Result<(), ErrorCode> {
    if !expected.is_empty() && constant_time_eq(provided, expected) {
        Ok(())
    } else {
        Err(ErrorCode::Unauthorized)
    }
}
