//! Credential Authority Library
//!
//! Credential store, authenticator and token service for the authority
//! process, plus the delegated authorization gate that resource services
//! mount in front of protected routes.

pub mod auth;
pub mod config;
pub mod gate;
pub mod middleware;
pub mod telemetry;
