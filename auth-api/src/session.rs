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

//! Browser sessions.
//!
//! A session is an opaque UUID carried in an `HttpOnly; SameSite=Lax` cookie
//! named `session`, mapped server-side to the signed-in [`UserIdentity`].
//! Handlers never read the cookie themselves: they take a [`SessionContext`],
//! which resolves the session once per request.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};
use chrono::{DateTime, Duration, Utc};
use rpa_auth_types::UserIdentity;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AppError, AuthError};

pub const SESSION_COOKIE: &str = "session";

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store `identity` under `session_id`, replacing any previous value.
    async fn insert(
        &self,
        session_id: &str,
        identity: UserIdentity,
        ttl: Duration,
    ) -> Result<(), AuthError>;

    async fn get(&self, session_id: &str) -> Result<Option<UserIdentity>, AuthError>;

    async fn remove(&self, session_id: &str) -> Result<(), AuthError>;
}

/// In-process [`SessionStore`] with per-entry expiry.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, (UserIdentity, DateTime<Utc>)>>,
    clock: Arc<dyn Clock>,
}

impl MemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of stored sessions, expired ones included until purged.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(
        &self,
        session_id: &str,
        identity: UserIdentity,
        ttl: Duration,
    ) -> Result<(), AuthError> {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::SessionStore(format!("session TTL {ttl} out of range")))?;

        let mut sessions = self.sessions.write().await;
        // Abandoned sessions are never read again, so expiry is swept here.
        sessions.retain(|_, (_, exp)| *exp > now);
        sessions.insert(session_id.to_string(), (identity, expires_at));
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<UserIdentity>, AuthError> {
        let now = self.clock.now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                None => return Ok(None),
                Some((identity, expires_at)) if *expires_at > now => {
                    return Ok(Some(identity.clone()))
                }
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write().await;
        if matches!(sessions.get(session_id), Some((_, expires_at)) if *expires_at <= now) {
            sessions.remove(session_id);
        }
        Ok(None)
    }

    async fn remove(&self, session_id: &str) -> Result<(), AuthError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

/// A fresh, unguessable session id.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// The session id from the `session` cookie, if it is a well-formed UUID.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix("session="))
        .find_map(|value| Uuid::parse_str(value.trim()).ok())
        .map(|id| id.to_string())
}

/// Build a `Set-Cookie` header value for the session id.
pub fn build_session_cookie(
    session_id: &str,
    ttl_secs: i64,
    domain: Option<&str>,
    secure: bool,
) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    if let Some(d) = domain {
        cookie.push_str(&format!("; Domain={d}"));
    }
    cookie
}

/// Build a `Set-Cookie` header that clears the `session` cookie.
pub fn build_clear_session_cookie(domain: Option<&str>, secure: bool) -> String {
    let mut cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    if let Some(d) = domain {
        cookie.push_str(&format!("; Domain={d}"));
    }
    cookie
}

/// The caller's session, resolved once per request.
///
/// Extraction never fails for a missing or unknown session; operations
/// that need an identity call [`SessionContext::require_identity`].
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    session_id: Option<String>,
    identity: Option<UserIdentity>,
}

impl SessionContext {
    pub fn new(session_id: Option<String>, identity: Option<UserIdentity>) -> Self {
        Self {
            session_id,
            identity,
        }
    }

    /// Id of a session that exists in the store.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn require_identity(&self) -> Result<&UserIdentity, AuthError> {
        self.identity.as_ref().ok_or(AuthError::NotAuthenticated)
    }
}

impl<S> FromRequestParts<S> for SessionContext
where
    Arc<dyn SessionStore>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(session_id) = session_id_from_headers(&parts.headers) else {
            return Ok(Self::default());
        };

        let store = Arc::<dyn SessionStore>::from_ref(state);
        match store.get(&session_id).await? {
            Some(identity) => Ok(Self::new(Some(session_id), Some(identity))),
            None => Ok(Self::default()),
        }
    }
}
