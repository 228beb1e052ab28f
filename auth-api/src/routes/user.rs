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

//! Sign-in route handlers: redirect URL, callback, login check, token
//! refresh and logout.
//!
//! A successful sign-in answers with the user's identity and sets an opaque
//! session id inside an `HttpOnly; SameSite=Lax` cookie named `session`.

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use rpa_auth_types::{
    requests::{LogoutQuery, SignInQuery},
    responses::{MessageResponse, RedirectUrlResponse},
    APIResponse, UserIdentity,
};

use crate::error::AppError;
use crate::oauth::build_signin_url;
use crate::session::{build_clear_session_cookie, build_session_cookie, SessionContext};
use crate::state::AppState;

fn with_cookie(mut response: Response, cookie: &str) -> Result<Response, AppError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|_| AppError::internal("invalid Set-Cookie header value"))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(response)
}

/// GET /user/redirect-url
pub async fn redirect_url(
    State(state): State<AppState>,
) -> Result<Json<APIResponse<RedirectUrlResponse>>, AppError> {
    let url = build_signin_url(&state.provider).map_err(|e| {
        tracing::error!("Cannot build sign-in URL: {e}");
        AppError::internal("cannot build sign-in URL")
    })?;
    Ok(Json(APIResponse::ok(RedirectUrlResponse { url })))
}

/// POST /user/sign/in?code=...&state=...
pub async fn sign_in(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<SignInQuery>,
) -> Result<Response, AppError> {
    let signed_in = state
        .establisher
        .sign_in(&query.code, &query.state, &session)
        .await?;

    let cookie = build_session_cookie(
        &signed_in.session_id,
        state.session_ttl_secs,
        state.cookie_domain.as_deref(),
        state.cookie_secure,
    );
    with_cookie(
        Json(APIResponse::ok(signed_in.identity)).into_response(),
        &cookie,
    )
}

/// GET /user/login-check
pub async fn login_check(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<APIResponse<UserIdentity>>, AppError> {
    let identity = state.establisher.login_check(&session).await?;
    Ok(Json(APIResponse::ok(identity)))
}

/// POST /user/refresh-token
pub async fn refresh_token(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<APIResponse<MessageResponse>>, AppError> {
    state.establisher.refresh_tokens(&session).await?;
    Ok(Json(APIResponse::ok(MessageResponse {
        message: "token refreshed".to_string(),
    })))
}

/// POST /user/logout?accessToken=...
///
/// Works without a session. When the request carries one, it is ended and
/// the cookie cleared once the provider has accepted the logout.
pub async fn logout(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<LogoutQuery>,
) -> Result<Response, AppError> {
    let cleared = state
        .establisher
        .logout(&query.access_token, &session)
        .await?;

    let response = Json(APIResponse::ok(MessageResponse {
        message: "logged out".to_string(),
    }))
    .into_response();

    if cleared {
        let clear = build_clear_session_cookie(state.cookie_domain.as_deref(), state.cookie_secure);
        with_cookie(response, &clear)
    } else {
        Ok(response)
    }
}
