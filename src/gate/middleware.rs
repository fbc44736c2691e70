//! Delegated Authorization Middleware
//! Mission: Admit only requests whose bearer token the authority vouches for

use crate::auth::models::{PrincipalId, ValidatedIdentity};
use crate::gate::client::TokenValidator;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Gate state: the remote validation capability
#[derive(Clone)]
pub struct Gate {
    validator: Arc<dyn TokenValidator>,
}

impl Gate {
    pub fn new(validator: Arc<dyn TokenValidator>) -> Self {
        Self { validator }
    }
}

/// Principal resolved by the gate, attached to request extensions.
/// Downstream handlers read it with `Extension<AuthenticatedPrincipal>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedPrincipal {
    pub principal_id: PrincipalId,
    pub email: String,
}

impl From<ValidatedIdentity> for AuthenticatedPrincipal {
    fn from(identity: ValidatedIdentity) -> Self {
        Self {
            principal_id: identity.principal_id,
            email: identity.email,
        }
    }
}

/// Single gate failure. Missing header, wrong scheme, rejected token and an
/// unreachable authority all look the same to the caller.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GateError {
    #[error("unauthenticated")]
    Unauthenticated,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": "UNAUTHORIZED",
            "message": "Authentication required",
            "code": StatusCode::UNAUTHORIZED.as_u16(),
        });

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Gate middleware: validates the bearer token with the authority on every
/// request. Fails closed, no retry.
pub async fn require_session(
    State(gate): State<Gate>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut req: Request,
    next: Next,
) -> Result<Response, GateError> {
    let path = req.uri().path().to_owned();

    let token = bearer_token(req.headers()).map_err(|reason| {
        warn!(client_ip = %addr.ip(), path = %path, reason, "access denied");
        GateError::Unauthenticated
    })?;

    let identity = match gate.validator.validate(&token).await {
        Ok(identity) => identity,
        Err(reason) => {
            warn!(client_ip = %addr.ip(), path = %path, reason = %reason, "access denied: token not validated");
            return Err(GateError::Unauthenticated);
        }
    };

    info!(
        principal_id = identity.principal_id,
        method = %req.method(),
        path = %path,
        "access granted"
    );

    req.extensions_mut()
        .insert(AuthenticatedPrincipal::from(identity));

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<String, &'static str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or("missing authorization header")?;

    value
        .to_str()
        .ok()
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::to_owned)
        .ok_or("not a bearer token")
}

/// Put every route of `router` behind the gate
pub fn protect<S>(router: Router<S>, gate: Gate) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(gate, require_session))
}

/// Extract the gate-resolved principal (use after `require_session`)
pub fn principal_from_request(req: &Request) -> Option<&AuthenticatedPrincipal> {
    req.extensions().get::<AuthenticatedPrincipal>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::client::ValidationFailure;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        extract::connect_info::MockConnectInfo,
        routing::get,
        Extension,
    };
    use tower::ServiceExt;

    /// Accepts exactly one token
    struct FixedValidator;

    #[async_trait]
    impl TokenValidator for FixedValidator {
        async fn validate(&self, token: &str) -> Result<ValidatedIdentity, ValidationFailure> {
            match token {
                "good" => Ok(ValidatedIdentity {
                    principal_id: 7,
                    email: "alice@example.com".to_string(),
                }),
                "down" => Err(ValidationFailure::Transport("connection refused".to_string())),
                _ => Err(ValidationFailure::Rejected(401)),
            }
        }
    }

    fn app() -> Router {
        let routes = Router::new().route(
            "/whoami",
            get(|Extension(p): Extension<AuthenticatedPrincipal>| async move {
                p.principal_id.to_string()
            }),
        );
        protect(routes, Gate::new(Arc::new(FixedValidator)))
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))))
    }

    async fn call(authorization: Option<&str>) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let resp = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_valid_token_attaches_principal() {
        let (status, body) = call(Some("Bearer good")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "7");
    }

    #[tokio::test]
    async fn test_all_failures_look_identical() {
        let missing = call(None).await;
        let wrong_scheme = call(Some("Basic good")).await;
        let rejected = call(Some("Bearer bad")).await;
        let unreachable = call(Some("Bearer down")).await;

        assert_eq!(missing.0, StatusCode::UNAUTHORIZED);
        assert_eq!(missing, wrong_scheme);
        assert_eq!(missing, rejected);
        assert_eq!(missing, unreachable);
    }

    #[test]
    fn test_principal_from_request() {
        let mut req = axum::http::Request::new(Body::empty());
        assert!(principal_from_request(&req).is_none());

        req.extensions_mut().insert(AuthenticatedPrincipal {
            principal_id: 3,
            email: "carol@example.com".to_string(),
        });
        assert_eq!(principal_from_request(&req).unwrap().principal_id, 3);
    }
}
