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

//! Identity-provider records: users, permissions, roles and groups.
//!
//! Field names follow the provider's camelCase JSON. The provider emits
//! `null` for empty lists, so list fields go through [`null_as_default`].
//! Claims and attributes this crate does not model are kept in `extra`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Deserialize `null` as `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Normalized user identity, decoded from the full identity-token payload.
///
/// # Example payload
///
/// ```json
/// {
///   "owner": "admin",
///   "name": "alice",
///   "id": "0f4c1c9e-...",
///   "displayName": "Alice",
///   "email": "alice@example.com",
///   "groups": ["admin/robots"],
///   "exp": 1767225600
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    /// Organization (tenant) the user belongs to.
    #[serde(default, deserialize_with = "null_as_default")]
    pub owner: String,

    /// Unique user name within the organization. Keys the credential store.
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,

    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub user_type: String,

    /// Group ids in `owner/name` form.
    #[serde(default, deserialize_with = "null_as_default")]
    pub groups: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub permissions: Vec<Permission>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub roles: Vec<Role>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserIdentity {
    /// `owner/name`, the form the provider uses to reference users.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// The first group the user is assigned to, if any.
    pub fn primary_group(&self) -> Option<&str> {
        self.groups
            .iter()
            .map(String::as_str)
            .find(|group| !group.is_empty())
    }
}

/// Permission record as returned by the provider.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default, deserialize_with = "null_as_default")]
    pub owner: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    /// Users granted the permission, in `owner/name` form.
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub roles: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resources: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub effect: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Permission {
    /// Whether `qualified_user` (`owner/name`) is listed in `users`.
    pub fn grants(&self, qualified_user: &str) -> bool {
        self.users.iter().any(|u| u == qualified_user)
    }
}

/// Role record as returned by the provider.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(default, deserialize_with = "null_as_default")]
    pub owner: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Group record as returned by the provider.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default, deserialize_with = "null_as_default")]
    pub owner: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parent_id: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub group_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
