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

//! API error types.
//!
//! Every failed API response is returned as `APIResponse<APIError>` with `success: false`.

use serde::{Deserialize, Serialize};

/// Structured error returned in the `result` field of a failed [`super::APIResponse`].
///
/// The `code` field is a machine-readable identifier (e.g. `"TOKEN_EXPIRED"`).
/// The `message` field is a human-readable description suitable for display.
/// The `engineering_error` field carries debug-level detail that is useful
/// during development. Auth failures never populate it: provider payloads
/// and verification internals stay in the server log.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct APIError {
    /// Machine-readable error code (e.g. `"NOT_LOGGED_IN"`, `"SIGNATURE_INVALID"`).
    pub code: String,

    /// Human-readable error message.
    pub message: String,

    /// Optional engineering-level detail for debugging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engineering_error: Option<String>,
}

impl APIError {
    fn with_message(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            engineering_error: None,
        }
    }

    pub fn not_logged_in() -> Self {
        Self::with_message("NOT_LOGGED_IN", "Not logged in.")
    }

    pub fn invalid_parameter(detail: &str) -> Self {
        Self::with_message("INVALID_PARAMETER", format!("Invalid parameter: {detail}"))
    }

    pub fn oauth_exchange_failed() -> Self {
        Self::with_message(
            "OAUTH_EXCHANGE_FAILED",
            "Cannot get OAuth token from the identity provider.",
        )
    }

    pub fn certificate_fetch_failed() -> Self {
        Self::with_message(
            "CERTIFICATE_FETCH_FAILED",
            "Cannot fetch the signing certificate from the identity provider.",
        )
    }

    pub fn token_parse_failed() -> Self {
        Self::with_message("TOKEN_PARSE_FAILED", "Cannot parse the identity token.")
    }

    pub fn certificate_invalid() -> Self {
        Self::with_message(
            "CERTIFICATE_INVALID",
            "The identity provider's signing certificate is invalid.",
        )
    }

    pub fn signature_invalid() -> Self {
        Self::with_message(
            "SIGNATURE_INVALID",
            "Cannot verify the identity token signature.",
        )
    }

    pub fn claims_missing() -> Self {
        Self::with_message(
            "CLAIMS_MISSING",
            "Cannot get claims from the identity token payload.",
        )
    }

    pub fn token_expired() -> Self {
        Self::with_message("TOKEN_EXPIRED", "The identity token has expired.")
    }

    pub fn claims_decode_failed() -> Self {
        Self::with_message(
            "CLAIMS_DECODE_FAILED",
            "Cannot convert the identity token claims to a user.",
        )
    }

    pub fn credential_store_unavailable() -> Self {
        Self::with_message(
            "CREDENTIAL_STORE_UNAVAILABLE",
            "The server-side token store is unavailable.",
        )
    }

    pub fn credential_expired() -> Self {
        Self::with_message(
            "CREDENTIAL_EXPIRED",
            "The server-side token has expired, please log in again.",
        )
    }

    pub fn missing_refresh_token() -> Self {
        Self::with_message(
            "REFRESH_TOKEN_MISSING",
            "No refresh token is stored for this user, please log in again.",
        )
    }

    pub fn provider_error() -> Self {
        Self::with_message(
            "PROVIDER_ERROR",
            "The identity provider rejected the request.",
        )
    }

    pub fn not_found(detail: &str) -> Self {
        Self::with_message("NOT_FOUND", detail.to_string())
    }

    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: "Internal server error".to_string(),
            engineering_error: Some(detail.to_string()),
        }
    }
}

impl std::fmt::Display for APIError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for APIError {}
