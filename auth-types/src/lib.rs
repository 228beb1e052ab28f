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

//! Shared API types for the RPA auth gateway.
//!
//! This crate defines the API contract between the auth gateway and its
//! consumers (the desktop/web clients and integration tests), plus the
//! identity-provider records that flow through it. It is intentionally
//! framework-agnostic: no axum, no HTTP client types.

pub mod error;
pub mod requests;
pub mod responses;
pub mod user;

pub use error::APIError;
pub use responses::APIResponse;
pub use user::{Group, Permission, Role, UserIdentity};
