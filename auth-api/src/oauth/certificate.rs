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

//! Signing certificates: the `get-application` response shape and an
//! optional TTL cache in front of the fetcher.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::clock::Clock;
use crate::error::AuthError;
use crate::provider::casdoor::ProviderResponse;

/// PEM-encoded X.509 certificate published by the provider for one
/// application.
#[derive(Debug, Clone, PartialEq)]
pub struct Certificate {
    /// Application the certificate was fetched for.
    pub application: String,
    pub pem: String,
}

/// The part of an application record that carries its signing key.
/// Only present when the request asked for `withKey=1`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cert_public_key: Option<String>,
}

/// Extract the certificate from a `get-application` envelope.
pub fn certificate_from_response(
    application: &str,
    response: ProviderResponse<ApplicationRecord>,
) -> Result<Certificate, AuthError> {
    if !response.is_ok() {
        return Err(AuthError::CertificateFetch(format!(
            "get-application for {application} failed: {}",
            response.msg
        )));
    }

    let record = response.data.ok_or_else(|| {
        AuthError::CertificateFetch(format!("no application data returned for {application}"))
    })?;

    let pem = record
        .cert_public_key
        .filter(|pem| !pem.trim().is_empty())
        .ok_or_else(|| {
            AuthError::CertificateFetch(format!("application {application} has no certificate"))
        })?;

    Ok(Certificate {
        application: application.to_string(),
        pem,
    })
}

/// Caches certificates per application for a fixed TTL.
///
/// A TTL of zero disables caching, so every sign-in fetches fresh key
/// material. The lock is never held across a provider call: callers check
/// the cache, fetch on a miss, then [`insert`](Self::insert).
pub struct CertificateCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, (Certificate, DateTime<Utc>)>>,
}

impl CertificateCache {
    pub fn new(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX / 1000)),
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl > Duration::zero()
    }

    /// A cached certificate for `application` that is younger than the TTL.
    pub async fn get(&self, application: &str) -> Option<Certificate> {
        if !self.is_enabled() {
            return None;
        }
        let entries = self.entries.read().await;
        let (certificate, fetched_at) = entries.get(application)?;
        if self.clock.now() - *fetched_at < self.ttl {
            Some(certificate.clone())
        } else {
            None
        }
    }

    pub async fn insert(&self, certificate: Certificate) {
        if !self.is_enabled() {
            return;
        }
        let now = self.clock.now();
        self.entries
            .write()
            .await
            .insert(certificate.application.clone(), (certificate, now));
    }

    /// Drop the cached certificate, e.g. after it failed to verify a token.
    pub async fn invalidate(&self, application: &str) {
        self.entries.write().await.remove(application);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn response(json: serde_json::Value) -> ProviderResponse<ApplicationRecord> {
        serde_json::from_value(json).expect("valid envelope")
    }

    fn cert(application: &str) -> Certificate {
        Certificate {
            application: application.to_string(),
            pem: "-----BEGIN CERTIFICATE-----\n...\n-----END CERTIFICATE-----".to_string(),
        }
    }

    #[test]
    fn extracts_cert_public_key() {
        let resp = response(serde_json::json!({
            "status": "ok",
            "msg": "",
            "data": { "name": "app-built-in", "certPublicKey": "-----BEGIN CERTIFICATE-----" }
        }));
        let certificate = certificate_from_response("app-built-in", resp).unwrap();
        assert_eq!(certificate.application, "app-built-in");
        assert_eq!(certificate.pem, "-----BEGIN CERTIFICATE-----");
    }

    #[test]
    fn error_status_is_a_fetch_error() {
        let resp = response(serde_json::json!({
            "status": "error",
            "msg": "The application: admin/app-built-in does not exist",
            "data": null
        }));
        let err = certificate_from_response("app-built-in", resp).unwrap_err();
        assert!(matches!(err, AuthError::CertificateFetch(_)));
    }

    #[test]
    fn missing_data_is_a_fetch_error() {
        let resp = response(serde_json::json!({ "status": "ok", "msg": "" }));
        let err = certificate_from_response("app-built-in", resp).unwrap_err();
        assert!(matches!(err, AuthError::CertificateFetch(_)));
    }

    #[test]
    fn empty_key_is_a_fetch_error() {
        let resp = response(serde_json::json!({
            "status": "ok",
            "msg": "",
            "data": { "name": "app-built-in", "certPublicKey": "" }
        }));
        let err = certificate_from_response("app-built-in", resp).unwrap_err();
        assert!(matches!(err, AuthError::CertificateFetch(_)));
    }

    #[tokio::test]
    async fn zero_ttl_never_caches() {
        let cache = CertificateCache::new(0, Arc::new(ManualClock::new(Utc::now())));
        cache.insert(cert("app-built-in")).await;
        assert!(cache.get("app-built-in").await.is_none());
    }

    #[tokio::test]
    async fn cached_certificate_expires_after_ttl() {
        let clock = ManualClock::new(Utc::now());
        let cache = CertificateCache::new(300, Arc::new(clock.clone()));

        cache.insert(cert("app-built-in")).await;
        assert_eq!(cache.get("app-built-in").await, Some(cert("app-built-in")));

        clock.advance(Duration::seconds(300));
        assert!(cache.get("app-built-in").await.is_none());
    }

    #[tokio::test]
    async fn invalidate_drops_entry() {
        let cache = CertificateCache::new(300, Arc::new(ManualClock::new(Utc::now())));
        cache.insert(cert("app-built-in")).await;
        cache.invalidate("app-built-in").await;
        assert!(cache.get("app-built-in").await.is_none());
    }
}
