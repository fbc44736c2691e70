//! Authority error taxonomy and its wire mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures surfaced by the authenticator. Each maps to one fixed status and
/// user-safe message; internal detail stays in the logs.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("malformed request")]
    MalformedRequest,
    #[error("internal error")]
    Internal,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::DuplicateEmail => StatusCode::CONFLICT,
            AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::MalformedRequest => StatusCode::BAD_REQUEST,
            AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AuthError::DuplicateEmail => "CONFLICT",
            AuthError::InvalidCredentials | AuthError::InvalidToken => "UNAUTHORIZED",
            AuthError::MalformedRequest => "BAD_REQUEST",
            AuthError::Internal => "INTERNAL",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AuthError::DuplicateEmail => "Email already registered",
            AuthError::InvalidCredentials => "Invalid credentials",
            AuthError::InvalidToken => "Invalid or expired token",
            AuthError::MalformedRequest => "Invalid request body",
            AuthError::Internal => "Internal server error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = json!({
            "error": self.code(),
            "message": self.message(),
            "code": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
