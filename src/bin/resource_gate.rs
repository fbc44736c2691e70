//! Resource Gate Binary
//!
//! Minimal resource-service boundary: every route except `/health` sits
//! behind the delegated authorization gate, which asks the credential
//! authority to validate the caller's bearer token on each request.
//!
//! Usage:
//!   resource_gate --auth-service-url http://auth-service:8080
//!
//! Environment:
//!   AUTH_SERVICE_URL - Base URL of the credential authority (required)
//!   GATE_BIND_ADDR - Listen address (default: 0.0.0.0:8081)
//!   GATE_VALIDATE_TIMEOUT_MS - Per-request validation timeout (default: 3000)
//!   GATE_CORS_ORIGINS - Comma-separated allowed origins (default: any)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{middleware, routing::get, Extension, Json, Router};
use clap::Parser;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::info;

use credential_authority::{
    config::{load_env, GateArgs, GateConfig},
    gate::{protect, AuthenticatedPrincipal, AuthorityClient, Gate},
    middleware::{cors_layer, request_logging},
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing("credential_authority=debug,resource_gate=info,tower_http=info");

    let config = GateConfig::from_args(GateArgs::parse())?;

    let client = AuthorityClient::new(&config.auth_service_url, config.validate_timeout)?;
    info!(
        validate_url = client.validate_url(),
        timeout_ms = config.validate_timeout.as_millis() as u64,
        "🛡️ Delegated authorization gate initialized"
    );
    let gate = Gate::new(Arc::new(client));

    let protected = protect(Router::new().route("/whoami", get(whoami)), gate);

    let app = Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&config.cors_origins));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🎯 Resource gate listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

/// Echo the principal the gate resolved for this request
async fn whoami(Extension(principal): Extension<AuthenticatedPrincipal>) -> Json<AuthenticatedPrincipal> {
    Json(principal)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
