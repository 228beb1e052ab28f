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

//! HTTP client for a Casdoor-compatible identity provider.
//!
//! Management endpoints (`/api/get-*`, `/api/logout`) answer with a
//! `{ "status": "ok" | "error", "msg": ..., "data": ... }` envelope and are
//! called with HTTP basic auth (client id / client secret). The OAuth token
//! endpoints speak plain OAuth2 and are handled by [`crate::oauth::exchange`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rpa_auth_types::{Group, Permission, UserIdentity};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ProviderConfig;
use crate::error::AuthError;
use crate::oauth::certificate::{certificate_from_response, ApplicationRecord};
use crate::oauth::exchange::{authorization_code_form, parse_token_response, refresh_token_form};
use crate::oauth::{Certificate, TokenPair};

use super::{IdentityProvider, UserDirectory};

/// Response envelope of the provider's management API.
#[derive(Debug, Deserialize)]
pub struct ProviderResponse<T> {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ProviderResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// The payload of a successful response; `None` when the provider found
    /// nothing.
    fn into_data(self, action: &str) -> Result<Option<T>, AuthError> {
        if self.is_ok() {
            Ok(self.data)
        } else {
            Err(AuthError::Provider(format!("{action} failed: {}", self.msg)))
        }
    }
}

/// [`IdentityProvider`] and [`UserDirectory`] over HTTP.
#[derive(Clone)]
pub struct CasdoorClient {
    http: Client,
    config: ProviderConfig,
}

impl CasdoorClient {
    /// Every request made through this client is aborted after `timeout`.
    pub fn new(config: ProviderConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// GET a management endpoint and decode its envelope. Transport and
    /// decoding failures are wrapped with `wrap`.
    async fn get_envelope<T: DeserializeOwned>(
        &self,
        action: &str,
        query: &[(&str, &str)],
        wrap: fn(String) -> AuthError,
    ) -> Result<ProviderResponse<T>, AuthError> {
        let resp = self
            .http
            .get(self.config.api_url(action))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .query(query)
            .send()
            .await
            .map_err(|e| wrap(format!("{action} request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(wrap(format!("{action} returned HTTP {}", resp.status())));
        }

        resp.json::<ProviderResponse<T>>()
            .await
            .map_err(|e| wrap(format!("{action} returned a malformed body: {e}")))
    }

    async fn post_token_form(
        &self,
        url: String,
        form: Vec<(&'static str, String)>,
    ) -> Result<TokenPair, AuthError> {
        let resp = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::OAuthExchange(format!("token request failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::OAuthExchange(format!("cannot read token response: {e}")))?;
        parse_token_response(status, &body)
    }

    async fn get_user(&self, query: &[(&str, &str)]) -> Result<Option<UserIdentity>, AuthError> {
        self.get_envelope::<UserIdentity>("get-user", query, AuthError::Provider)
            .await?
            .into_data("get-user")
    }
}

#[async_trait]
impl IdentityProvider for CasdoorClient {
    async fn exchange_code(&self, code: &str, state: &str) -> Result<TokenPair, AuthError> {
        tracing::debug!(state, "Exchanging authorization code");
        self.post_token_form(
            self.config.token_url(),
            authorization_code_form(&self.config, code),
        )
        .await
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
        scope: &str,
    ) -> Result<TokenPair, AuthError> {
        self.post_token_form(
            self.config.refresh_token_url(),
            refresh_token_form(&self.config, refresh_token, scope),
        )
        .await
    }

    async fn signing_certificate(&self, application: &str) -> Result<Certificate, AuthError> {
        let id = format!("{}/{application}", self.config.organization);
        let response = self
            .get_envelope::<ApplicationRecord>(
                "get-application",
                &[("id", id.as_str()), ("withKey", "1")],
                AuthError::CertificateFetch,
            )
            .await?;
        certificate_from_response(application, response)
    }

    async fn logout(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .get_envelope::<serde_json::Value>(
                "logout",
                &[
                    ("id_token_hint", access_token),
                    ("state", self.config.application_name.as_str()),
                ],
                AuthError::Provider,
            )
            .await?;
        response.into_data("logout").map(|_| ())
    }
}

#[async_trait]
impl UserDirectory for CasdoorClient {
    async fn user_by_id(&self, user_id: &str) -> Result<Option<UserIdentity>, AuthError> {
        self.get_user(&[
            ("owner", self.config.organization.as_str()),
            ("userId", user_id),
        ])
        .await
    }

    async fn user_by_phone(&self, phone: &str) -> Result<Option<UserIdentity>, AuthError> {
        self.get_user(&[("owner", self.config.organization.as_str()), ("phone", phone)])
            .await
    }

    async fn user_by_name(&self, name: &str) -> Result<Option<UserIdentity>, AuthError> {
        let id = format!("{}/{name}", self.config.organization);
        self.get_user(&[("id", id.as_str())]).await
    }

    async fn permissions(&self, owner: &str) -> Result<Vec<Permission>, AuthError> {
        Ok(self
            .get_envelope::<Vec<Permission>>("get-permissions", &[("owner", owner)], AuthError::Provider)
            .await?
            .into_data("get-permissions")?
            .unwrap_or_default())
    }

    async fn group(&self, group_id: &str) -> Result<Option<Group>, AuthError> {
        self.get_envelope::<Group>("get-group", &[("id", group_id)], AuthError::Provider)
            .await?
            .into_data("get-group")
    }
}
