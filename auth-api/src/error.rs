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

//! Error types.
//!
//! [`AuthError`] is the domain error every sign-in, verification and storage
//! operation returns. [`AppError`] is the HTTP-facing error that implements
//! Axum's `IntoResponse`: every error is returned as `APIResponse<APIError>`
//! with `success: false`, paired with the appropriate HTTP status code.
//! The detail carried by an `AuthError` is logged, never sent to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rpa_auth_types::{APIError, APIResponse};

/// Failure kinds of the authentication boundary.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A required request parameter is absent or empty.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Transport or protocol failure while talking to the token endpoint.
    #[error("OAuth token exchange failed: {0}")]
    OAuthExchange(String),

    #[error("signing certificate fetch failed: {0}")]
    CertificateFetch(String),

    #[error("cannot parse identity token: {0}")]
    TokenParse(String),

    #[error("invalid signing certificate: {0}")]
    CertificateInvalid(String),

    /// Signature verification returned `false` or failed outright.
    #[error("identity token signature is invalid: {0}")]
    SignatureInvalid(String),

    #[error("identity token carries no claims")]
    ClaimsMissing,

    /// `exp` is absent, not numeric, or not strictly in the future.
    #[error("identity token has expired")]
    TokenExpired,

    #[error("cannot decode identity token claims: {0}")]
    ClaimsDecode(String),

    #[error("credential store unavailable: {0}")]
    CredentialStore(String),

    #[error("session store unavailable: {0}")]
    SessionStore(String),

    /// The session is valid but its server-side credential entry is gone.
    #[error("server-side credential expired for user {0}")]
    CredentialExpired(String),

    #[error("no refresh token stored for user {0}")]
    MissingRefreshToken(String),

    /// No session, or a session without an identity.
    #[error("not logged in")]
    NotAuthenticated,

    /// A pass-through call was rejected by the identity provider.
    #[error("identity provider error: {0}")]
    Provider(String),

    #[error("{0}")]
    NotFound(String),
}

/// Application-level error that pairs an HTTP status code with an [`APIError`].
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub body: APIError,
}

impl AppError {
    pub fn new(status: StatusCode, body: APIError) -> Self {
        Self { status, body }
    }

    pub fn not_logged_in() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, APIError::not_logged_in())
    }

    pub fn invalid_parameter(detail: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, APIError::invalid_parameter(detail))
    }

    pub fn internal(detail: &str) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            APIError::internal_error(detail),
        )
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::InvalidParameter(_)
            | AuthError::NotAuthenticated
            | AuthError::NotFound(_) => {
                tracing::debug!("Request rejected: {err}");
            }
            AuthError::CredentialStore(_) | AuthError::SessionStore(_) => {
                tracing::error!("Storage failure: {err}");
            }
            _ => tracing::warn!("Authentication failure: {err}"),
        }

        match err {
            AuthError::InvalidParameter(detail) => Self::invalid_parameter(&detail),
            AuthError::OAuthExchange(_) => {
                Self::new(StatusCode::UNAUTHORIZED, APIError::oauth_exchange_failed())
            }
            AuthError::CertificateFetch(_) => {
                Self::new(StatusCode::BAD_GATEWAY, APIError::certificate_fetch_failed())
            }
            AuthError::TokenParse(_) => {
                Self::new(StatusCode::UNAUTHORIZED, APIError::token_parse_failed())
            }
            AuthError::CertificateInvalid(_) => {
                Self::new(StatusCode::BAD_GATEWAY, APIError::certificate_invalid())
            }
            AuthError::SignatureInvalid(_) => {
                Self::new(StatusCode::UNAUTHORIZED, APIError::signature_invalid())
            }
            AuthError::ClaimsMissing => {
                Self::new(StatusCode::UNAUTHORIZED, APIError::claims_missing())
            }
            AuthError::TokenExpired => {
                Self::new(StatusCode::UNAUTHORIZED, APIError::token_expired())
            }
            AuthError::ClaimsDecode(_) => {
                Self::new(StatusCode::UNAUTHORIZED, APIError::claims_decode_failed())
            }
            AuthError::CredentialStore(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                APIError::credential_store_unavailable(),
            ),
            AuthError::SessionStore(_) => Self::internal("session store unavailable"),
            AuthError::CredentialExpired(_) => {
                Self::new(StatusCode::UNAUTHORIZED, APIError::credential_expired())
            }
            AuthError::MissingRefreshToken(_) => {
                Self::new(StatusCode::UNAUTHORIZED, APIError::missing_refresh_token())
            }
            AuthError::NotAuthenticated => Self::not_logged_in(),
            AuthError::Provider(_) => {
                Self::new(StatusCode::BAD_GATEWAY, APIError::provider_error())
            }
            AuthError::NotFound(detail) => {
                Self::new(StatusCode::NOT_FOUND, APIError::not_found(&detail))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = APIResponse::error(self.body);
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    /// Consume the response body and deserialize it to `APIResponse<APIError>`.
    async fn read_error_body(resp: Response) -> (StatusCode, APIResponse<APIError>) {
        let status = resp.status();
        let bytes = Body::new(resp.into_body())
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        let parsed: APIResponse<APIError> =
            serde_json::from_slice(&bytes).expect("deserialize error body");
        (status, parsed)
    }

    #[tokio::test]
    async fn not_authenticated_produces_401_not_logged_in() {
        let resp = AppError::from(AuthError::NotAuthenticated).into_response();
        let (status, body) = read_error_body(resp).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(!body.success);
        assert_eq!(body.result.code, "NOT_LOGGED_IN");
    }

    #[tokio::test]
    async fn token_expired_produces_401() {
        let resp = AppError::from(AuthError::TokenExpired).into_response();
        let (status, body) = read_error_body(resp).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.result.code, "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn exchange_failure_does_not_leak_provider_payload() {
        let err = AuthError::OAuthExchange(
            r#"{"error":"invalid_grant","error_description":"code used"}"#.to_string(),
        );
        let resp = AppError::from(err).into_response();
        let (status, body) = read_error_body(resp).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.result.code, "OAUTH_EXCHANGE_FAILED");
        assert!(body.result.engineering_error.is_none());
        assert!(!body.result.message.contains("invalid_grant"));
    }

    #[tokio::test]
    async fn provider_error_hides_provider_message() {
        let resp = AppError::from(AuthError::Provider("secret detail".into())).into_response();
        let (status, body) = read_error_body(resp).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.result.code, "PROVIDER_ERROR");
        assert!(!body.result.message.contains("secret detail"));
    }

    #[tokio::test]
    async fn credential_store_failure_produces_503() {
        let resp = AppError::from(AuthError::CredentialStore("down".into())).into_response();
        let (status, body) = read_error_body(resp).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.result.code, "CREDENTIAL_STORE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn invalid_parameter_produces_400() {
        let resp = AppError::from(AuthError::InvalidParameter("code".into())).into_response();
        let (status, body) = read_error_body(resp).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.result.code, "INVALID_PARAMETER");
    }
}
