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

//! The decoded payload of an identity token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rpa_auth_types::UserIdentity;
use serde_json::{Map, Value};

use crate::error::AuthError;

/// JSON object payload of a verified identity token.
///
/// Only built from a payload whose signature has already been checked.
#[derive(Debug, Clone)]
pub struct ClaimsSet {
    claims: Map<String, Value>,
}

impl ClaimsSet {
    /// Decode the base64url payload segment.
    ///
    /// A payload that is `null`, not an object, or an empty object is
    /// [`AuthError::ClaimsMissing`]; bytes that are not JSON at all are
    /// [`AuthError::ClaimsDecode`].
    pub fn decode(payload_b64: &str) -> Result<Self, AuthError> {
        if payload_b64.is_empty() {
            return Err(AuthError::ClaimsMissing);
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|e| AuthError::ClaimsDecode(format!("payload is not base64url: {e}")))?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::ClaimsDecode(format!("payload is not JSON: {e}")))?;

        match value {
            Value::Object(claims) if !claims.is_empty() => Ok(Self { claims }),
            _ => Err(AuthError::ClaimsMissing),
        }
    }

    /// The `exp` claim in seconds since the epoch, if present and numeric.
    pub fn expiration(&self) -> Option<i64> {
        match self.claims.get("exp")? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
            _ => None,
        }
    }

    /// Reject a token whose `exp` is absent, non-numeric, or not strictly
    /// after `now`.
    pub fn ensure_not_expired(&self, now: i64) -> Result<(), AuthError> {
        match self.expiration() {
            Some(exp) if exp > now => Ok(()),
            _ => Err(AuthError::TokenExpired),
        }
    }

    /// Deserialize the full payload into a [`UserIdentity`].
    pub fn into_identity(self) -> Result<UserIdentity, AuthError> {
        let identity: UserIdentity = serde_json::from_value(Value::Object(self.claims))
            .map_err(|e| AuthError::ClaimsDecode(e.to_string()))?;
        if identity.name.trim().is_empty() {
            return Err(AuthError::ClaimsDecode("name claim is empty".into()));
        }
        Ok(identity)
    }
}
