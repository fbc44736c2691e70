//! Authority Client
//! Mission: Ask the authority whether a bearer token is valid, and for whom

use crate::auth::models::{ValidateResponse, ValidatedIdentity};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Why a remote validation did not succeed. Logged locally; the gate never
/// reveals it to the caller.
#[derive(Debug, Error)]
pub enum ValidationFailure {
    #[error("authority call timed out")]
    Timeout,
    #[error("authority unreachable: {0}")]
    Transport(String),
    #[error("authority rejected token with status {0}")]
    Rejected(u16),
    #[error("unreadable authority response: {0}")]
    BadResponse(String),
}

/// Validation capability consumed by the gate
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<ValidatedIdentity, ValidationFailure>;
}

/// Calls `GET {authority}/validate` with the caller's token
pub struct AuthorityClient {
    http: reqwest::Client,
    validate_url: String,
}

impl AuthorityClient {
    pub fn new(authority_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            validate_url: format!("{}/validate", authority_url.trim_end_matches('/')),
        })
    }

    pub fn validate_url(&self) -> &str {
        &self.validate_url
    }
}

#[async_trait]
impl TokenValidator for AuthorityClient {
    async fn validate(&self, token: &str) -> Result<ValidatedIdentity, ValidationFailure> {
        let resp = self
            .http
            .get(&self.validate_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ValidationFailure::Timeout
                } else {
                    ValidationFailure::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ValidationFailure::Rejected(status.as_u16()));
        }

        let body = resp
            .json::<ValidateResponse>()
            .await
            .map_err(|e| ValidationFailure::BadResponse(e.to_string()))?;

        if !body.valid {
            return Err(ValidationFailure::Rejected(status.as_u16()));
        }

        Ok(ValidatedIdentity {
            principal_id: body.principal_id,
            email: body.email,
        })
    }
}
