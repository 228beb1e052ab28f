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

//! Axum router configuration for the auth gateway.

pub mod directory;
pub mod user;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Build the full application router with all `/user` routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Sign-in / session
        .route("/user/redirect-url", get(user::redirect_url))
        .route("/user/sign/in", post(user::sign_in))
        .route("/user/login-check", get(user::login_check))
        .route("/user/refresh-token", post(user::refresh_token))
        .route("/user/logout", post(user::logout))
        // Current user
        .route("/user/now/userinfo", get(directory::current_user))
        .route("/user/login-status", get(directory::login_status))
        .route("/user/now/permissions", get(directory::current_permissions))
        .route("/user/now/tenant", get(directory::current_tenant))
        .route("/user/now/group-id", get(directory::current_group_id))
        // Directory lookups
        .route("/user/userinfo/phone", get(directory::user_by_phone))
        .route("/user/userinfo/page-list", post(directory::users_by_ids))
        .route("/user/userinfo/{id}", get(directory::user_by_id))
        .route(
            "/user/group-info/username",
            get(directory::group_by_username),
        )
}
