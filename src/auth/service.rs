//! Authenticator
//! Mission: Register principals, check logins and vouch for session tokens

use crate::auth::{
    credential_store::{CredentialStore, StoreError},
    error::AuthError,
    jwt::TokenService,
    models::{Principal, ValidatedIdentity},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Salt used to burn a derivation for unknown emails so both login failure
/// paths cost the same.
const DUMMY_SALT: &str = "00000000000000000000000000000000";

pub struct Authenticator {
    store: Arc<CredentialStore>,
    tokens: Arc<TokenService>,
}

impl Authenticator {
    pub fn new(store: Arc<CredentialStore>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Store a new principal and issue its first session token
    pub fn register(
        &self,
        email: &str,
        password: &str,
        client: SocketAddr,
    ) -> Result<(Principal, String), AuthError> {
        let principal = match self.store.register(email, password) {
            Ok(principal) => principal,
            Err(StoreError::DuplicateEmail) => {
                warn!(target: "audit", op = "register", outcome = "duplicate_email", email, client_ip = %client.ip(), "registration rejected");
                return Err(AuthError::DuplicateEmail);
            }
            Err(e) => {
                error!(target: "audit", op = "register", outcome = "error", email, client_ip = %client.ip(), error = %e, "registration failed");
                return Err(AuthError::Internal);
            }
        };

        let token = self.issue(&principal, "register", client)?;

        info!(target: "audit", op = "register", outcome = "ok", principal_id = principal.id, email = %principal.email, client_ip = %client.ip(), "principal registered");
        Ok((principal, token))
    }

    /// Check credentials and issue a session token. Unknown email and wrong
    /// password produce the same error.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        client: SocketAddr,
    ) -> Result<(Principal, String), AuthError> {
        let Some(principal) = self.store.find_by_email(email) else {
            let _ = self.store.scheme().derive(password, DUMMY_SALT);
            warn!(target: "audit", op = "login", outcome = "unknown_email", email, client_ip = %client.ip(), "login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .store
            .scheme()
            .verify(password, &principal.salt, &principal.verifier)
        {
            warn!(target: "audit", op = "login", outcome = "wrong_password", principal_id = principal.id, client_ip = %client.ip(), "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue(&principal, "login", client)?;

        info!(target: "audit", op = "login", outcome = "ok", principal_id = principal.id, client_ip = %client.ip(), "login successful");
        Ok((principal, token))
    }

    /// Resolve the principal behind a presented token
    pub fn validate(&self, token: &str, client: SocketAddr) -> Result<ValidatedIdentity, AuthError> {
        match self.tokens.validate(token) {
            Ok(identity) => {
                info!(target: "audit", op = "validate", outcome = "ok", principal_id = identity.principal_id, client_ip = %client.ip(), "token accepted");
                Ok(identity)
            }
            Err(reason) => {
                warn!(target: "audit", op = "validate", outcome = "invalid_token", reason = %reason, client_ip = %client.ip(), "token rejected");
                Err(AuthError::InvalidToken)
            }
        }
    }

    fn issue(&self, principal: &Principal, op: &str, client: SocketAddr) -> Result<String, AuthError> {
        self.tokens.issue(principal).map_err(|e| {
            error!(target: "audit", op, outcome = "error", principal_id = principal.id, client_ip = %client.ip(), error = %e, "token issuance failed");
            AuthError::Internal
        })
    }
}
