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

//! Handlers for "who am I" and user/group lookups.
//!
//! Everything here is either answered from the session or forwarded to the
//! identity provider through [`crate::provider::UserDirectory`]. All routes
//! except `/user/login-status` require a signed-in session.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rpa_auth_types::{
    requests::{PhoneQuery, UsernameQuery},
    responses::{GroupIdResponse, LoginStatusResponse, TenantResponse},
    APIResponse, Group, Permission, UserIdentity,
};

use crate::error::{AppError, AuthError};
use crate::session::SessionContext;
use crate::state::AppState;

/// Group ids are `owner/name`; bare names belong to the user's organization.
fn qualified_group_id(owner: &str, group: &str) -> String {
    if group.contains('/') {
        group.to_string()
    } else {
        format!("{owner}/{group}")
    }
}

/// GET /user/now/userinfo
pub async fn current_user(
    session: SessionContext,
) -> Result<Json<APIResponse<UserIdentity>>, AppError> {
    let identity = session.require_identity()?;
    Ok(Json(APIResponse::ok(identity.clone())))
}

/// GET /user/login-status
pub async fn login_status(session: SessionContext) -> Json<APIResponse<LoginStatusResponse>> {
    Json(APIResponse::ok(LoginStatusResponse {
        logged_in: session.is_authenticated(),
    }))
}

/// GET /user/userinfo/{id}
pub async fn user_by_id(
    State(state): State<AppState>,
    session: SessionContext,
    Path(user_id): Path<String>,
) -> Result<Json<APIResponse<UserIdentity>>, AppError> {
    session.require_identity()?;
    if user_id.trim().is_empty() {
        return Err(AppError::invalid_parameter("id must not be empty"));
    }

    let user = state
        .directory
        .user_by_id(&user_id)
        .await?
        .ok_or_else(|| AuthError::NotFound(format!("user {user_id} not found")))?;
    Ok(Json(APIResponse::ok(user)))
}

/// GET /user/userinfo/phone?phone=...
pub async fn user_by_phone(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<PhoneQuery>,
) -> Result<Json<APIResponse<UserIdentity>>, AppError> {
    session.require_identity()?;
    if query.phone.trim().is_empty() {
        return Err(AppError::invalid_parameter("phone must not be empty"));
    }

    let user = state
        .directory
        .user_by_phone(&query.phone)
        .await?
        .ok_or_else(|| AuthError::NotFound("no user with that phone number".to_string()))?;
    Ok(Json(APIResponse::ok(user)))
}

/// POST /user/userinfo/page-list
///
/// Body: JSON array of user ids. Users are returned in request order;
/// unknown ids are skipped.
pub async fn users_by_ids(
    State(state): State<AppState>,
    session: SessionContext,
    Json(ids): Json<Vec<String>>,
) -> Result<Json<APIResponse<Vec<UserIdentity>>>, AppError> {
    session.require_identity()?;
    if ids.is_empty() {
        return Err(AppError::invalid_parameter("user id list must not be empty"));
    }

    let users = state.directory.users_by_ids(&ids).await?;
    Ok(Json(APIResponse::ok(users)))
}

/// GET /user/now/permissions
pub async fn current_permissions(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<APIResponse<Vec<Permission>>>, AppError> {
    let identity = session.require_identity()?;
    let qualified = identity.qualified_name();

    let granted: Vec<Permission> = state
        .directory
        .permissions(&identity.owner)
        .await?
        .into_iter()
        .filter(|p| p.grants(&qualified))
        .collect();
    Ok(Json(APIResponse::ok(granted)))
}

/// GET /user/now/tenant
pub async fn current_tenant(
    session: SessionContext,
) -> Result<Json<APIResponse<TenantResponse>>, AppError> {
    let identity = session.require_identity()?;
    if identity.owner.is_empty() {
        return Err(AuthError::NotFound("user has no tenant".to_string()).into());
    }
    Ok(Json(APIResponse::ok(TenantResponse {
        tenant_id: identity.owner.clone(),
    })))
}

/// GET /user/now/group-id
pub async fn current_group_id(
    session: SessionContext,
) -> Result<Json<APIResponse<GroupIdResponse>>, AppError> {
    let identity = session.require_identity()?;
    let group = identity
        .primary_group()
        .ok_or_else(|| AuthError::NotFound("user is not assigned to a group".to_string()))?;
    Ok(Json(APIResponse::ok(GroupIdResponse {
        group_id: group.to_string(),
    })))
}

/// GET /user/group-info/username?username=...
pub async fn group_by_username(
    State(state): State<AppState>,
    session: SessionContext,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<APIResponse<Group>>, AppError> {
    session.require_identity()?;
    let username = query.username.trim();
    if username.is_empty() {
        return Err(AppError::invalid_parameter("username must not be empty"));
    }

    let user = state
        .directory
        .user_by_name(username)
        .await?
        .ok_or_else(|| AuthError::NotFound(format!("user {username} not found")))?;
    let group_id = user
        .primary_group()
        .map(|group| qualified_group_id(&user.owner, group))
        .ok_or_else(|| AuthError::NotFound(format!("user {username} has no group")))?;
    let group = state
        .directory
        .group(&group_id)
        .await?
        .ok_or_else(|| AuthError::NotFound(format!("group {group_id} not found")))?;
    Ok(Json(APIResponse::ok(group)))
}
