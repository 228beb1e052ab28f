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

//! RPA auth gateway library.
//!
//! This crate provides the Axum router, application state, and configuration
//! for the sign-in gateway in front of a Casdoor-compatible identity
//! provider. The binary entry point (`main.rs`) is a thin wrapper that calls
//! into this library.

pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod oauth;
pub mod provider;
pub mod routes;
pub mod session;
pub mod signin;
pub mod state;
