//! Authentication Module
//! Mission: Issue salted credentials and signed session tokens, and vouch for them

pub mod api;
pub mod credential_store;
pub mod error;
pub mod jwt;
pub mod models;
pub mod password;
pub mod service;

pub use api::AuthState;
pub use credential_store::CredentialStore;
pub use error::AuthError;
pub use jwt::TokenService;
pub use password::{Argon2Scheme, KdfParams, VerifierScheme};
pub use service::Authenticator;
