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

//! Shared application state passed to every Axum handler via `State`.

use std::sync::Arc;

use axum::extract::FromRef;
use chrono::Duration;

use crate::clock::Clock;
use crate::config::{Config, ProviderConfig};
use crate::credentials::CredentialStore;
use crate::oauth::CertificateCache;
use crate::provider::{IdentityProvider, UserDirectory};
use crate::session::SessionStore;
use crate::signin::{SessionEstablisher, SignInSettings};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Sign-in, refresh, login-check and logout.
    pub establisher: Arc<SessionEstablisher>,
    /// Read-only provider lookups.
    pub directory: Arc<dyn UserDirectory>,
    pub sessions: Arc<dyn SessionStore>,
    /// Used to build the sign-in redirect URL.
    pub provider: ProviderConfig,
    /// Session cookie `Max-Age` in seconds.
    pub session_ttl_secs: i64,
    /// Cookie domain (e.g. ".example.com"), or `None` for default.
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(
        config: &Config,
        provider: Arc<dyn IdentityProvider>,
        directory: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionStore>,
        credentials: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let settings = SignInSettings {
            certificate_application: config.provider.certificate_application.clone(),
            scope: config.provider.scope.clone(),
            credential_ttl: Duration::seconds(config.credential_ttl_secs),
            session_ttl: Duration::seconds(config.session_ttl_secs),
        };
        let establisher = SessionEstablisher::new(
            provider,
            sessions.clone(),
            credentials,
            CertificateCache::new(config.certificate_cache_ttl_secs, clock.clone()),
            clock,
            settings,
        );

        Self {
            establisher: Arc::new(establisher),
            directory,
            sessions,
            provider: config.provider.clone(),
            session_ttl_secs: config.session_ttl_secs,
            cookie_domain: config.cookie_domain.clone(),
            cookie_secure: config.cookie_secure,
        }
    }
}

impl FromRef<AppState> for Arc<dyn SessionStore> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
