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

//! Server-side store of provider tokens, keyed by user name.
//!
//! Entries hold the access/refresh pair issued at sign-in so that later
//! server-initiated calls to the provider can be authorized. A `put` always
//! replaces the whole entry and restarts its TTL; the pair is never updated
//! field by field.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::clock::Clock;
use crate::error::AuthError;

/// One user's provider tokens.
#[derive(Clone, PartialEq)]
pub struct CredentialEntry {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store the pair for `user_key`, replacing any previous entry.
    async fn put(
        &self,
        user_key: &str,
        access_token: &str,
        refresh_token: &str,
        ttl: Duration,
    ) -> Result<(), AuthError>;

    /// Whether a live entry exists for `user_key`.
    async fn has(&self, user_key: &str) -> Result<bool, AuthError>;

    async fn refresh_token(&self, user_key: &str) -> Result<Option<String>, AuthError>;

    async fn access_token(&self, user_key: &str) -> Result<Option<String>, AuthError>;

    async fn remove(&self, user_key: &str) -> Result<(), AuthError>;
}

/// In-process [`CredentialStore`].
///
/// Expired entries are treated as absent and purged when next touched.
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, CredentialEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCredentialStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// The live entry for `user_key`, dropping it if it has expired.
    async fn live_entry(&self, user_key: &str) -> Option<CredentialEntry> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().await;
            match entries.get(user_key) {
                None => return None,
                Some(entry) if entry.expires_at > now => return Some(entry.clone()),
                Some(_) => {}
            }
        }

        // Re-check under the write lock: a concurrent put may have renewed it.
        let mut entries = self.entries.write().await;
        match entries.get(user_key) {
            Some(entry) if entry.expires_at > now => Some(entry.clone()),
            Some(_) => {
                entries.remove(user_key);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn put(
        &self,
        user_key: &str,
        access_token: &str,
        refresh_token: &str,
        ttl: Duration,
    ) -> Result<(), AuthError> {
        if user_key.is_empty() {
            return Err(AuthError::CredentialStore("empty user key".into()));
        }
        let expires_at = self.clock.now().checked_add_signed(ttl).ok_or_else(|| {
            AuthError::CredentialStore(format!("credential TTL {ttl} out of range"))
        })?;
        let entry = CredentialEntry {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_at,
        };
        self.entries
            .write()
            .await
            .insert(user_key.to_string(), entry);
        Ok(())
    }

    async fn has(&self, user_key: &str) -> Result<bool, AuthError> {
        Ok(self.live_entry(user_key).await.is_some())
    }

    async fn refresh_token(&self, user_key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.live_entry(user_key).await.map(|e| e.refresh_token))
    }

    async fn access_token(&self, user_key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.live_entry(user_key).await.map(|e| e.access_token))
    }

    async fn remove(&self, user_key: &str) -> Result<(), AuthError> {
        self.entries.write().await.remove(user_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn store() -> (MemoryCredentialStore, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        (MemoryCredentialStore::new(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn second_put_replaces_first_pair() {
        let (store, _) = store();
        store.put("alice", "at1", "rt1", Duration::hours(24)).await.unwrap();
        store.put("alice", "at2", "rt2", Duration::hours(24)).await.unwrap();

        assert_eq!(store.refresh_token("alice").await.unwrap().as_deref(), Some("rt2"));
        assert_eq!(store.access_token("alice").await.unwrap().as_deref(), Some("at2"));
    }

    #[tokio::test]
    async fn entry_is_absent_once_ttl_elapses() {
        let (store, clock) = store();
        store.put("alice", "at1", "rt1", Duration::seconds(86_400)).await.unwrap();

        clock.advance(Duration::seconds(86_399));
        assert!(store.has("alice").await.unwrap());

        clock.advance(Duration::seconds(1));
        assert!(!store.has("alice").await.unwrap());
        assert_eq!(store.refresh_token("alice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_resets_ttl() {
        let (store, clock) = store();
        store.put("alice", "at1", "rt1", Duration::seconds(100)).await.unwrap();
        clock.advance(Duration::seconds(90));
        store.put("alice", "at2", "rt2", Duration::seconds(100)).await.unwrap();
        clock.advance(Duration::seconds(90));
        assert!(store.has("alice").await.unwrap());
    }

    #[tokio::test]
    async fn out_of_range_ttl_is_a_store_error() {
        let (store, _) = store();
        let err = store
            .put("alice", "at1", "rt1", Duration::seconds(9_000_000_000_000))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::CredentialStore(_)));
        assert!(!store.has("alice").await.unwrap());
    }

    #[tokio::test]
    async fn remove_deletes_entry() {
        let (store, _) = store();
        store.put("alice", "at1", "rt1", Duration::hours(1)).await.unwrap();
        store.remove("alice").await.unwrap();
        assert!(!store.has("alice").await.unwrap());
        // Removing again is not an error.
        store.remove("alice").await.unwrap();
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let (store, _) = store();
        store.put("alice", "at-a", "rt-a", Duration::hours(1)).await.unwrap();
        store.put("bob", "at-b", "rt-b", Duration::hours(1)).await.unwrap();
        store.remove("alice").await.unwrap();
        assert_eq!(store.refresh_token("bob").await.unwrap().as_deref(), Some("rt-b"));
    }

    #[tokio::test]
    async fn concurrent_puts_never_mix_pairs() {
        let (store, _) = store();
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .put("alice", &format!("at{i}"), &format!("rt{i}"), Duration::hours(1))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let access = store.access_token("alice").await.unwrap().unwrap();
        let refresh = store.refresh_token("alice").await.unwrap().unwrap();
        assert_eq!(access.trim_start_matches("at"), refresh.trim_start_matches("rt"));
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let entry = CredentialEntry {
            access_token: "at-secret".into(),
            refresh_token: "rt-secret".into(),
            expires_at: Utc::now(),
        };
        let rendered = format!("{entry:?}");
        assert!(!rendered.contains("secret"));
    }
}
