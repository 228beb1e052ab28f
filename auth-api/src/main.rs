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

//! RPA auth gateway server entry point.
//!
//! A standalone Axum service that signs users in through the identity
//! provider, keeps their sessions and provider tokens, and answers "who am
//! I" lookups for the rest of the platform.

use std::sync::Arc;
use std::time::Duration;

use rpa_auth_api::clock::{Clock, SystemClock};
use rpa_auth_api::config::Config;
use rpa_auth_api::credentials::MemoryCredentialStore;
use rpa_auth_api::provider::CasdoorClient;
use rpa_auth_api::routes;
use rpa_auth_api::session::MemorySessionStore;
use rpa_auth_api::state::AppState;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().map_err(anyhow::Error::msg)?;

    let client = Arc::new(CasdoorClient::new(
        config.provider.clone(),
        Duration::from_secs(config.provider_timeout_secs),
    )?);
    tracing::info!("Identity provider at {}", config.provider.endpoint);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = AppState::new(
        &config,
        client.clone(),
        client,
        Arc::new(MemorySessionStore::new(clock.clone())),
        Arc::new(MemoryCredentialStore::new(clock.clone())),
        clock,
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;

    tracing::info!("Auth gateway listening on {}", config.listen_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
