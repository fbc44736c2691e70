//! Authentication API Endpoints
//! Mission: Expose register, login and token validation over HTTP

use crate::auth::{
    credential_store::CredentialStore,
    error::AuthError,
    jwt::TokenService,
    models::{AuthResponse, CredentialsRequest, Principal, PrincipalResponse, ValidateResponse},
    password::Argon2Scheme,
    service::Authenticator,
};
use crate::config::AuthorityConfig;
use crate::middleware::request_logging;
use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Arc<Authenticator>,
}

impl AuthState {
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator }
    }

    /// Wire store, verifier scheme and token service from startup settings
    pub fn from_config(config: &AuthorityConfig) -> anyhow::Result<Self> {
        // Bounds the TTL, so the hours conversion below cannot overflow
        config.validate()?;
        let ttl = chrono::Duration::hours(config.token_ttl_hours);

        let scheme = Arc::new(Argon2Scheme::new(config.kdf).context("Invalid Argon2 parameters")?);
        let store = Arc::new(CredentialStore::new(scheme));
        let tokens = Arc::new(TokenService::with_ttl(config.jwt_secret.as_bytes(), ttl));
        Ok(Self::new(Arc::new(Authenticator::new(store, tokens))))
    }
}

/// Authority routes. Serve with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/validate", get(validate))
        .layer(middleware::from_fn(request_logging))
        .with_state(state)
}

/// Register endpoint - POST /register
pub async fn register(
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    State(state): State<AuthState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthError> {
    let Json(req) = decode_body(payload, "register", client)?;

    let authenticator = state.authenticator.clone();
    let (principal, token) = tokio::task::spawn_blocking(move || {
        authenticator.register(&req.email, &req.password, client)
    })
    .await
    .map_err(join_failed)??;

    Ok(Json(auth_response(&state, &principal, token)))
}

/// Login endpoint - POST /login
pub async fn login(
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    State(state): State<AuthState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthError> {
    let Json(req) = decode_body(payload, "login", client)?;

    let authenticator = state.authenticator.clone();
    let (principal, token) = tokio::task::spawn_blocking(move || {
        authenticator.login(&req.email, &req.password, client)
    })
    .await
    .map_err(join_failed)??;

    Ok(Json(auth_response(&state, &principal, token)))
}

/// Token validation endpoint - GET /validate
/// Expects `Authorization: Bearer <token>`
pub async fn validate(
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<ValidateResponse>, AuthError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or_else(|| {
            warn!(target: "audit", op = "validate", outcome = "missing_bearer", client_ip = %client.ip(), "token rejected");
            AuthError::InvalidToken
        })?;

    let identity = state.authenticator.validate(token, client)?;
    Ok(Json(ValidateResponse::from(identity)))
}

/// Liveness probe - GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn decode_body(
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
    op: &str,
    client: SocketAddr,
) -> Result<Json<CredentialsRequest>, AuthError> {
    payload.map_err(|rejection| {
        warn!(target: "audit", op, outcome = "bad_request", client_ip = %client.ip(), reason = %rejection.body_text(), "request body rejected");
        AuthError::MalformedRequest
    })
}

fn auth_response(state: &AuthState, principal: &Principal, token: String) -> AuthResponse {
    AuthResponse {
        token,
        expires_in: state.authenticator.tokens().ttl_secs(),
        principal: PrincipalResponse::from_principal(principal),
    }
}

fn join_failed(e: tokio::task::JoinError) -> AuthError {
    error!("credential task failed: {}", e);
    AuthError::Internal
}
