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

//! Sign-in orchestration.
//!
//! [`SessionEstablisher::sign_in`] walks one callback through
//! `Unauthenticated -> Exchanging -> Verifying -> Authenticated`. Any step
//! can fail, and a failed sign-in leaves neither a session nor a credential
//! entry behind: the session is written first and removed again if the
//! credential write fails.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use rpa_auth_types::UserIdentity;

use crate::clock::Clock;
use crate::credentials::CredentialStore;
use crate::error::AuthError;
use crate::oauth::{validate_callback, verify_identity_token, Certificate, CertificateCache};
use crate::provider::IdentityProvider;
use crate::session::{new_session_id, SessionContext, SessionStore};

/// Progress of a single sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInStage {
    Unauthenticated,
    Exchanging,
    Verifying,
    Authenticated,
    Failed,
}

impl fmt::Display for SignInStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Exchanging => "exchanging",
            Self::Verifying => "verifying",
            Self::Authenticated => "authenticated",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct SignInSettings {
    /// Application whose certificate verifies identity tokens.
    pub certificate_application: String,
    /// Scope requested when refreshing tokens.
    pub scope: String,
    pub credential_ttl: Duration,
    pub session_ttl: Duration,
}

/// Result of a successful sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn {
    /// Newly created session; the caller hands it to the browser.
    pub session_id: String,
    pub identity: UserIdentity,
}

pub struct SessionEstablisher {
    provider: Arc<dyn IdentityProvider>,
    sessions: Arc<dyn SessionStore>,
    credentials: Arc<dyn CredentialStore>,
    certificates: CertificateCache,
    clock: Arc<dyn Clock>,
    settings: SignInSettings,
}

impl SessionEstablisher {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        sessions: Arc<dyn SessionStore>,
        credentials: Arc<dyn CredentialStore>,
        certificates: CertificateCache,
        clock: Arc<dyn Clock>,
        settings: SignInSettings,
    ) -> Self {
        Self {
            provider,
            sessions,
            credentials,
            certificates,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &SignInSettings {
        &self.settings
    }

    /// Exchange `code`, verify the identity token and commit the session
    /// and credential entry.
    ///
    /// A fresh session id is issued on every sign-in; a session the request
    /// already carried is discarded once the new one is committed.
    pub async fn sign_in(
        &self,
        code: &str,
        state: &str,
        current: &SessionContext,
    ) -> Result<SignedIn, AuthError> {
        let mut stage = SignInStage::Unauthenticated;
        match self.establish(code, state, &mut stage).await {
            Ok(signed_in) => {
                tracing::info!(user = %signed_in.identity.name, "Sign-in succeeded");
                if let Some(previous) = current.session_id() {
                    if let Err(e) = self.sessions.remove(previous).await {
                        tracing::warn!("Failed to discard previous session: {e}");
                    }
                }
                Ok(signed_in)
            }
            Err(err) => {
                tracing::warn!(%stage, "Sign-in failed: {err}");
                enter(&mut stage, SignInStage::Failed);
                Err(err)
            }
        }
    }

    async fn establish(
        &self,
        code: &str,
        state: &str,
        stage: &mut SignInStage,
    ) -> Result<SignedIn, AuthError> {
        validate_callback(code, state)?;

        enter(stage, SignInStage::Exchanging);
        let tokens = self.provider.exchange_code(code, state).await?;

        enter(stage, SignInStage::Verifying);
        let certificate = self.signing_certificate().await?;
        let identity =
            match verify_identity_token(tokens.identity_token(), &certificate, self.clock.now()) {
                Ok(identity) => identity,
                Err(err) => {
                    if matches!(err, AuthError::SignatureInvalid(_)) {
                        self.certificates.invalidate(&certificate.application).await;
                    }
                    return Err(err);
                }
            };

        let session_id = new_session_id();
        self.sessions
            .insert(&session_id, identity.clone(), self.settings.session_ttl)
            .await?;
        if let Err(err) = self
            .credentials
            .put(
                &identity.name,
                &tokens.access_token,
                &tokens.refresh_token,
                self.settings.credential_ttl,
            )
            .await
        {
            if let Err(e) = self.sessions.remove(&session_id).await {
                tracing::error!("Failed to roll back session after credential failure: {e}");
            }
            return Err(err);
        }

        enter(stage, SignInStage::Authenticated);
        Ok(SignedIn {
            session_id,
            identity,
        })
    }

    async fn signing_certificate(&self) -> Result<Certificate, AuthError> {
        let application = &self.settings.certificate_application;
        if let Some(certificate) = self.certificates.get(application).await {
            return Ok(certificate);
        }
        let certificate = self.provider.signing_certificate(application).await?;
        self.certificates.insert(certificate.clone()).await;
        Ok(certificate)
    }

    /// Rotate the session user's provider tokens.
    pub async fn refresh_tokens(&self, session: &SessionContext) -> Result<(), AuthError> {
        let identity = session.require_identity()?;
        let refresh_token = self
            .credentials
            .refresh_token(&identity.name)
            .await?
            .ok_or_else(|| AuthError::MissingRefreshToken(identity.name.clone()))?;

        let tokens = self
            .provider
            .refresh_token(&refresh_token, &self.settings.scope)
            .await?;
        self.credentials
            .put(
                &identity.name,
                &tokens.access_token,
                &tokens.refresh_token,
                self.settings.credential_ttl,
            )
            .await?;

        tracing::info!(user = %identity.name, "Provider tokens refreshed");
        Ok(())
    }

    /// The session identity, provided its credential entry is still live.
    pub async fn login_check(&self, session: &SessionContext) -> Result<UserIdentity, AuthError> {
        let identity = session.require_identity()?;
        if !self.credentials.has(&identity.name).await? {
            return Err(AuthError::CredentialExpired(identity.name.clone()));
        }
        Ok(identity.clone())
    }

    /// Invalidate `access_token` at the provider, then drop the caller's
    /// session and credential entry if the request carried one and the token
    /// is the one stored for the session user.
    ///
    /// Returns whether a local session was cleared. Nothing local changes
    /// when the provider call fails.
    pub async fn logout(
        &self,
        access_token: &str,
        session: &SessionContext,
    ) -> Result<bool, AuthError> {
        if access_token.trim().is_empty() {
            return Err(AuthError::InvalidParameter(
                "accessToken must not be empty".into(),
            ));
        }

        self.provider.logout(access_token).await?;

        let (Some(session_id), Some(identity)) = (session.session_id(), session.identity()) else {
            tracing::info!("Provider token invalidated");
            return Ok(false);
        };

        // Another user's token ends that token at the provider, not this session.
        if let Some(stored) = self.credentials.access_token(&identity.name).await? {
            if stored != access_token {
                tracing::warn!(user = %identity.name, "Logout token does not belong to the session user");
                return Ok(false);
            }
        }

        self.sessions.remove(session_id).await?;
        self.credentials.remove(&identity.name).await?;
        tracing::info!(user = %identity.name, "Logged out");
        Ok(true)
    }
}

fn enter(stage: &mut SignInStage, next: SignInStage) {
    tracing::debug!(from = %stage, to = %next, "Sign-in stage");
    *stage = next;
}
