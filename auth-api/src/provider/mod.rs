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

//! The identity provider as seen by this service.
//!
//! [`IdentityProvider`] covers the calls the sign-in flow makes;
//! [`UserDirectory`] covers the read-only lookups behind the `/user/*`
//! pass-through endpoints. Both are implemented over HTTP by
//! [`casdoor::CasdoorClient`] and injected as trait objects so the
//! orchestration can be tested against a scripted provider.

pub mod casdoor;

use async_trait::async_trait;
use rpa_auth_types::{Group, Permission, UserIdentity};

use crate::error::AuthError;
use crate::oauth::{Certificate, TokenPair};

pub use casdoor::CasdoorClient;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an authorization code with the token endpoint.
    async fn exchange_code(&self, code: &str, state: &str) -> Result<TokenPair, AuthError>;

    /// Run the `refresh_token` grant.
    async fn refresh_token(&self, refresh_token: &str, scope: &str)
        -> Result<TokenPair, AuthError>;

    /// Fetch the certificate that signs tokens for `application`.
    async fn signing_certificate(&self, application: &str) -> Result<Certificate, AuthError>;

    /// Invalidate `access_token` at the provider.
    async fn logout(&self, access_token: &str) -> Result<(), AuthError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_by_id(&self, user_id: &str) -> Result<Option<UserIdentity>, AuthError>;

    async fn user_by_phone(&self, phone: &str) -> Result<Option<UserIdentity>, AuthError>;

    /// Look up a user by name within the configured organization.
    async fn user_by_name(&self, name: &str) -> Result<Option<UserIdentity>, AuthError>;

    /// All permissions defined in `owner`'s organization.
    async fn permissions(&self, owner: &str) -> Result<Vec<Permission>, AuthError>;

    /// `group_id` is `owner/name`.
    async fn group(&self, group_id: &str) -> Result<Option<Group>, AuthError>;

    /// Users for `ids`, in request order. Unknown ids are skipped.
    async fn users_by_ids(&self, ids: &[String]) -> Result<Vec<UserIdentity>, AuthError> {
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = self.user_by_id(id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }
}
