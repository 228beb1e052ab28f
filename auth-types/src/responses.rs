/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Response types for the auth gateway REST API.
//!
//! Every endpoint returns an [`APIResponse<T>`] envelope:
//! - On success: `{ "success": true,  "result": <T> }`
//! - On failure: `{ "success": false, "result": <APIError> }`

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Generic envelope
// ---------------------------------------------------------------------------

/// Top-level API response envelope.
///
/// # Success example
///
/// ```json
/// { "success": true, "result": { "owner": "admin", "name": "alice", ... } }
/// ```
///
/// # Error example
///
/// ```json
/// { "success": false, "result": { "code": "TOKEN_EXPIRED", "message": "..." } }
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct APIResponse<A: Serialize> {
    pub success: bool,
    pub result: A,
}

impl<A: Serialize> APIResponse<A> {
    /// Wrap a successful result.
    pub fn ok(result: A) -> Self {
        Self {
            success: true,
            result,
        }
    }
}

impl APIResponse<crate::error::APIError> {
    /// Wrap an error result.
    pub fn error(err: crate::error::APIError) -> Self {
        Self {
            success: false,
            result: err,
        }
    }
}

// ---------------------------------------------------------------------------
// Endpoint-specific response payloads
// ---------------------------------------------------------------------------

/// Response payload for `GET /user/redirect-url`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RedirectUrlResponse {
    /// Absolute provider sign-in URL the browser should navigate to.
    pub url: String,
}

/// Response payload for `POST /user/logout` and `POST /user/refresh-token`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MessageResponse {
    pub message: String,
}

/// Response payload for `GET /user/login-status`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoginStatusResponse {
    pub logged_in: bool,
}

/// Response payload for `GET /user/now/tenant`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TenantResponse {
    pub tenant_id: String,
}

/// Response payload for `GET /user/now/group-id`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GroupIdResponse {
    pub group_id: String,
}
