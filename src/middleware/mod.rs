//! HTTP middleware shared by the authority and resource services.
//!
//! This module provides:
//! - Request logging with latency tracking
//! - The CORS policy

pub mod cors;
pub mod logging;

pub use cors::cors_layer;
pub use logging::request_logging;
