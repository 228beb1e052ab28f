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

//! Request types for the auth gateway REST API.
//!
//! Query parameters default to empty strings so that a missing parameter
//! reaches the handler and is rejected with a structured `INVALID_PARAMETER`
//! error instead of a plain-text extractor rejection.

use serde::{Deserialize, Serialize};

/// Query parameters for `POST /user/sign/in`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SignInQuery {
    /// Authorization code issued by the identity provider.
    #[serde(default)]
    pub code: String,

    /// Opaque state echoed back by the identity provider.
    #[serde(default)]
    pub state: String,
}

/// Query parameters for `POST /user/logout`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LogoutQuery {
    /// Provider access token to invalidate.
    #[serde(rename = "accessToken", default)]
    pub access_token: String,
}

/// Query parameters for `GET /user/userinfo/phone`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PhoneQuery {
    #[serde(default)]
    pub phone: String,
}

/// Query parameters for `GET /user/group-info/username`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UsernameQuery {
    #[serde(default)]
    pub username: String,
}
