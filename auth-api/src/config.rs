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

//! Application configuration loaded from environment variables.

use std::env;

/// Credential store TTL used by the sign-in and refresh flows (24 hours).
pub const DEFAULT_CREDENTIAL_TTL_SECS: i64 = 24 * 60 * 60;

/// Upper bound for session and credential TTLs (ten years).
pub const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Configuration for the auth gateway.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server (e.g. "0.0.0.0:8080").
    pub listen_addr: String,
    /// Identity provider settings.
    pub provider: ProviderConfig,
    /// Lifetime of a credential store entry in seconds.
    pub credential_ttl_secs: i64,
    /// Lifetime of a session in seconds (also the cookie `Max-Age`).
    pub session_ttl_secs: i64,
    /// How long a fetched signing certificate may be reused. `0` fetches on
    /// every sign-in.
    pub certificate_cache_ttl_secs: u64,
    /// Timeout applied to every outbound identity-provider request.
    pub provider_timeout_secs: u64,
    /// Cookie domain (optional, e.g. ".example.com").
    pub cookie_domain: Option<String>,
    /// Whether the session cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
}

/// Casdoor-compatible identity provider configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL used for server-to-server calls.
    pub endpoint: String,
    /// Base URL handed to browsers in the sign-in redirect.
    pub external_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    /// Application this gateway signs users into.
    pub application_name: String,
    /// Organization prefix for application and user ids.
    pub organization: String,
    /// Application whose certificate verifies identity tokens.
    pub certificate_application: String,
    pub redirect_url: String,
    pub scope: String,
}

impl ProviderConfig {
    /// `{endpoint}/api/login/oauth/access_token`
    pub fn token_url(&self) -> String {
        format!("{}/api/login/oauth/access_token", self.endpoint)
    }

    /// `{endpoint}/api/login/oauth/refresh_token`
    pub fn refresh_token_url(&self) -> String {
        format!("{}/api/login/oauth/refresh_token", self.endpoint)
    }

    /// `{endpoint}/api/{action}`
    pub fn api_url(&self, action: &str) -> String {
        format!("{}/api/{action}", self.endpoint)
    }

    /// `{external_endpoint}/login/oauth/authorize`
    pub fn authorize_url(&self) -> String {
        format!("{}/login/oauth/authorize", self.external_endpoint)
    }
}

fn required(name: &str) -> Result<String, String> {
    env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("{name} environment variable is required"))
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) if !raw.is_empty() => raw
            .parse::<T>()
            .map_err(|_| format!("{name} has an invalid value: {raw}")),
        _ => Ok(default),
    }
}

/// TTLs must be positive and at most [`MAX_TTL_SECS`].
fn check_ttl(name: &str, secs: i64) -> Result<i64, String> {
    if secs <= 0 {
        return Err(format!("{name} must be positive"));
    }
    if secs > MAX_TTL_SECS {
        return Err(format!("{name} must not exceed {MAX_TTL_SECS}"));
    }
    Ok(secs)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Required
    /// - `CASDOOR_ENDPOINT`
    /// - `CASDOOR_CLIENT_ID`
    /// - `CASDOOR_CLIENT_SECRET`
    /// - `CASDOOR_APPLICATION_NAME`
    /// - `CASDOOR_REDIRECT_URL`
    ///
    /// # Optional
    /// - `LISTEN_ADDR` (default: `"0.0.0.0:8080"`)
    /// - `CASDOOR_EXTERNAL_ENDPOINT` (default: `CASDOOR_ENDPOINT`)
    /// - `CASDOOR_ORGANIZATION` (default: `"admin"`)
    /// - `CASDOOR_CERT_APPLICATION` (default: `"app-built-in"`)
    /// - `OAUTH_SCOPE` (default: `"read"`)
    /// - `CREDENTIAL_TTL_SECS` (default: `86400`)
    /// - `SESSION_TTL_SECS` (default: `86400`)
    /// - `CERTIFICATE_CACHE_TTL_SECS` (default: `0`)
    /// - `PROVIDER_TIMEOUT_SECS` (default: `10`)
    /// - `COOKIE_DOMAIN`
    /// - `COOKIE_SECURE` (default: `true`)
    pub fn from_env() -> Result<Self, String> {
        let endpoint = required("CASDOOR_ENDPOINT")?
            .trim_end_matches('/')
            .to_string();
        let external_endpoint = env::var("CASDOOR_EXTERNAL_ENDPOINT")
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| endpoint.clone());

        let provider = ProviderConfig {
            endpoint,
            external_endpoint,
            client_id: required("CASDOOR_CLIENT_ID")?,
            client_secret: required("CASDOOR_CLIENT_SECRET")?,
            application_name: required("CASDOOR_APPLICATION_NAME")?,
            organization: env::var("CASDOOR_ORGANIZATION")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "admin".to_string()),
            certificate_application: env::var("CASDOOR_CERT_APPLICATION")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "app-built-in".to_string()),
            redirect_url: required("CASDOOR_REDIRECT_URL")?,
            scope: env::var("OAUTH_SCOPE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "read".to_string()),
        };

        let credential_ttl_secs = check_ttl(
            "CREDENTIAL_TTL_SECS",
            parse_or("CREDENTIAL_TTL_SECS", DEFAULT_CREDENTIAL_TTL_SECS)?,
        )?;
        let session_ttl_secs = check_ttl(
            "SESSION_TTL_SECS",
            parse_or("SESSION_TTL_SECS", 24 * 60 * 60_i64)?,
        )?;

        Ok(Self {
            listen_addr: env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            provider,
            credential_ttl_secs,
            session_ttl_secs,
            certificate_cache_ttl_secs: parse_or("CERTIFICATE_CACHE_TTL_SECS", 0_u64)?,
            provider_timeout_secs: parse_or("PROVIDER_TIMEOUT_SECS", 10_u64)?,
            cookie_domain: env::var("COOKIE_DOMAIN").ok().filter(|s| !s.is_empty()),
            cookie_secure: parse_or("COOKIE_SECURE", true)?,
        })
    }
}
