//! Delegated Authorization Gate
//! Mission: Let resource services trust a session without holding the signing secret

pub mod client;
pub mod middleware;

pub use client::{AuthorityClient, TokenValidator, ValidationFailure};
pub use middleware::{principal_from_request, protect, require_session, AuthenticatedPrincipal, Gate, GateError};
