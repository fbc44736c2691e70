//! Authentication Models
//! Mission: Define principal, claim and wire data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric principal identity, assigned monotonically by the credential store.
pub type PrincipalId = u64;

/// Registered principal
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub email: String,
    #[serde(skip_serializing)]
    pub verifier: String, // Argon2id output, hex - never serialize
    #[serde(skip_serializing)]
    pub salt: String, // hex - never serialize
    pub created_at: DateTime<Utc>,
}

/// JWT Claims payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (principal id, decimal)
    pub email: String,
    pub iat: i64, // issued-at, unix seconds
    pub exp: i64, // expiration, unix seconds
}

impl Claims {
    /// Numeric principal id carried in `sub`
    pub fn principal_id(&self) -> Option<PrincipalId> {
        self.sub.parse().ok()
    }
}

/// Identity resolved from a valid token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedIdentity {
    pub principal_id: PrincipalId,
    pub email: String,
}

/// Register and login request body
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Register / login response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: i64, // seconds until expiration
    pub principal: PrincipalResponse,
}

/// Principal response (sanitized)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalResponse {
    pub id: PrincipalId,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl PrincipalResponse {
    pub fn from_principal(principal: &Principal) -> Self {
        Self {
            id: principal.id,
            email: principal.email.clone(),
            created_at: principal.created_at,
        }
    }
}

/// GET /validate response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub principal_id: PrincipalId,
    pub email: String,
}

impl From<ValidatedIdentity> for ValidateResponse {
    fn from(identity: ValidatedIdentity) -> Self {
        Self {
            valid: true,
            principal_id: identity.principal_id,
            email: identity.email,
        }
    }
}
