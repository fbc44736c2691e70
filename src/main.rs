//! Credential Authority
//! Mission: Register principals, log them in, and vouch for their session tokens
//!
//! Usage:
//!   AUTH_JWT_SECRET=... authority --port 8080
//!
//! Environment:
//!   AUTH_JWT_SECRET - Shared HMAC signing secret (required, >= 32 bytes)
//!   AUTH_BIND_ADDR / PORT - Listen address (default: 0.0.0.0:8080)
//!   AUTH_TOKEN_TTL_HOURS - Session lifetime (default: 24)
//!   AUTH_ARGON2_M_KIB / AUTH_ARGON2_T / AUTH_ARGON2_P - KDF work factors
//!   AUTH_CORS_ORIGINS - Comma-separated allowed origins (default: any)

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use credential_authority::{
    auth::{api, AuthState},
    config::{load_env, AuthorityArgs, AuthorityConfig},
    middleware::cors_layer,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing("credential_authority=debug,authority=info,audit=info,tower_http=info");

    let config = AuthorityConfig::from_args(AuthorityArgs::parse())?;
    let state = AuthState::from_config(&config)?;

    info!(
        ttl_hours = config.token_ttl_hours,
        argon2_m_kib = config.kdf.m_cost_kib,
        argon2_t = config.kdf.t_cost,
        "🔐 Credential authority initialized"
    );

    let app = api::router(state).layer(cors_layer(&config.cors_origins));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🎯 Authority listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
