//! Integration tests for the authority HTTP boundary
//!
//! Drives the full router in-process: register, login, validate and health,
//! including the failure outcomes that must be indistinguishable.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::connect_info::MockConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use credential_authority::auth::{
    api, models::Principal, Argon2Scheme, AuthState, Authenticator, CredentialStore, KdfParams,
    TokenService,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &[u8] = b"integration-test-secret-0123456789abcdef";

fn app() -> Router {
    let scheme = Argon2Scheme::new(KdfParams {
        m_cost_kib: 64,
        t_cost: 1,
        p_cost: 1,
    })
    .unwrap();
    let store = Arc::new(CredentialStore::new(Arc::new(scheme)));
    let tokens = Arc::new(TokenService::new(SECRET));
    let state = AuthState::new(Arc::new(Authenticator::new(store, tokens)));

    api::router(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn credentials(email: &str, password: &str) -> Value {
    json!({ "email": email, "password": password })
}

fn validate_request(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri("/validate");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_register_login_validate_scenario() {
    let app = app();

    let (status, body) = send(
        &app,
        post_json("/register", credentials("alice@example.com", "Secr3tPW")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["principal"]["email"], "alice@example.com");
    assert_eq!(body["expires_in"], 24 * 3600);
    assert!(body["principal"].get("verifier").is_none());
    assert!(body["principal"].get("salt").is_none());
    let principal_id = body["principal"]["id"].clone();

    let (status, body) = send(
        &app,
        post_json("/login", credentials("alice@example.com", "Secr3tPW")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["principal"]["id"], principal_id);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, validate_request(Some(&format!("Bearer {}", token)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["principal_id"], principal_id);

    let wrong_password = send(
        &app,
        post_json("/login", credentials("alice@example.com", "wrongpw")),
    )
    .await;
    let unknown_email = send(
        &app,
        post_json("/login", credentials("unknown@example.com", "Secr3tPW")),
    )
    .await;
    assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = app();

    let (status, _) = send(
        &app,
        post_json("/register", credentials("bob@example.com", "first")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        post_json("/register", credentials("bob@example.com", "second")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CONFLICT");

    // The original password still works; the rejected one does not.
    let (status, _) = send(
        &app,
        post_json("/login", credentials("bob@example.com", "first")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        post_json("/login", credentials("bob@example.com", "second")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_concurrent_duplicate_registration_single_winner() {
    let app = app();

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                send(
                    &app,
                    post_json(
                        "/register",
                        credentials("race@example.com", &format!("pw-{}", i)),
                    ),
                )
                .await
                .0
            })
        })
        .collect();

    let mut ok = 0;
    let mut conflict = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::OK => ok += 1,
            StatusCode::CONFLICT => conflict += 1,
            other => panic!("unexpected status {}", other),
        }
    }

    assert_eq!(ok, 1);
    assert_eq!(conflict, 11);
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let app = app();

    let not_json = Request::builder()
        .method(Method::POST)
        .uri("/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, not_json).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");

    let (status, _) = send(&app, post_json("/login", json!({ "email": "x@example.com" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let no_content_type = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .body(Body::from(credentials("x@example.com", "pw").to_string()))
        .unwrap();
    let (status, _) = send(&app, no_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_validate_rejections_share_one_outcome() {
    let app = app();

    let (_, body) = send(
        &app,
        post_json("/register", credentials("carol@example.com", "pw")),
    )
    .await;
    let token = body["token"].as_str().unwrap().to_string();

    // Flip the first character of the signature segment.
    let (head, signature) = token.rsplit_once('.').unwrap();
    let flipped = if signature.starts_with('A') { "B" } else { "A" };
    let tampered = format!("{}.{}{}", head, flipped, &signature[1..]);

    let expired = TokenService::new(SECRET)
        .issue_at(
            &Principal {
                id: 1,
                email: "carol@example.com".to_string(),
                verifier: String::new(),
                salt: String::new(),
                created_at: Utc::now(),
            },
            Utc::now() - Duration::hours(25),
        )
        .unwrap();

    let tampered = send(&app, validate_request(Some(&format!("Bearer {}", tampered)))).await;
    let expired = send(&app, validate_request(Some(&format!("Bearer {}", expired)))).await;
    let garbage = send(&app, validate_request(Some("Bearer not.a.token"))).await;
    let missing = send(&app, validate_request(None)).await;
    let wrong_scheme = send(&app, validate_request(Some(&format!("Token {}", token)))).await;

    assert_eq!(tampered.0, StatusCode::UNAUTHORIZED);
    assert_eq!(tampered.1["message"], "Invalid or expired token");
    assert_eq!(tampered, expired);
    assert_eq!(tampered, garbage);
    assert_eq!(tampered, missing);
    assert_eq!(tampered, wrong_scheme);
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}
