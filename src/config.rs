//! Service configuration
//! Mission: Turn CLI flags / environment into validated startup settings

use crate::auth::KdfParams;
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Shortest accepted signing secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted session lifetime, in hours (one year)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Parser, Debug)]
#[command(name = "authority")]
#[command(about = "Credential authority - register, login and token validation")]
pub struct AuthorityArgs {
    /// Listen address (overrides --port)
    #[arg(long, env = "AUTH_BIND_ADDR")]
    pub bind: Option<SocketAddr>,

    /// Listen port on all interfaces
    #[arg(long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Shared HMAC signing secret (required, at least 32 bytes)
    #[arg(long, env = "AUTH_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Session lifetime in hours
    #[arg(long, env = "AUTH_TOKEN_TTL_HOURS", default_value = "24")]
    pub token_ttl_hours: i64,

    /// Argon2 memory cost in KiB
    #[arg(long, env = "AUTH_ARGON2_M_KIB", default_value = "19456")]
    pub argon2_m_kib: u32,

    /// Argon2 iterations
    #[arg(long, env = "AUTH_ARGON2_T", default_value = "2")]
    pub argon2_t: u32,

    /// Argon2 parallelism
    #[arg(long, env = "AUTH_ARGON2_P", default_value = "1")]
    pub argon2_p: u32,

    /// Allowed CORS origins, comma-separated (empty = any)
    #[arg(long, env = "AUTH_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,
}

/// Authority settings
#[derive(Debug, Clone)]
pub struct AuthorityConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub kdf: KdfParams,
    pub cors_origins: Vec<String>,
}

impl AuthorityConfig {
    pub fn from_args(args: AuthorityArgs) -> Result<Self> {
        let jwt_secret = args
            .jwt_secret
            .context("AUTH_JWT_SECRET is not set; refusing to start without a signing secret")?;

        let config = Self {
            bind_addr: args
                .bind
                .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], args.port))),
            jwt_secret,
            token_ttl_hours: args.token_ttl_hours,
            kdf: KdfParams {
                m_cost_kib: args.argon2_m_kib,
                t_cost: args.argon2_t,
                p_cost: args.argon2_p,
            },
            cors_origins: clean_origins(args.cors_origins),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            bail!("AUTH_JWT_SECRET is empty");
        }
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            bail!(
                "AUTH_JWT_SECRET must be at least {} bytes (got {})",
                MIN_SECRET_LEN,
                self.jwt_secret.len()
            );
        }
        if self.token_ttl_hours <= 0 {
            bail!("AUTH_TOKEN_TTL_HOURS must be positive");
        }
        if self.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            bail!(
                "AUTH_TOKEN_TTL_HOURS must be at most {} (got {})",
                MAX_TOKEN_TTL_HOURS,
                self.token_ttl_hours
            );
        }
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(name = "resource_gate")]
#[command(about = "Resource service boundary guarded by delegated token validation")]
pub struct GateArgs {
    /// Listen address
    #[arg(long, env = "GATE_BIND_ADDR", default_value = "0.0.0.0:8081")]
    pub bind: SocketAddr,

    /// Base URL of the credential authority
    #[arg(long, env = "AUTH_SERVICE_URL")]
    pub auth_service_url: Option<String>,

    /// Timeout for each validation call, in milliseconds
    #[arg(long, env = "GATE_VALIDATE_TIMEOUT_MS", default_value = "3000")]
    pub validate_timeout_ms: u64,

    /// Allowed CORS origins, comma-separated (empty = any)
    #[arg(long, env = "GATE_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,
}

/// Gate settings
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub bind_addr: SocketAddr,
    pub auth_service_url: String,
    pub validate_timeout: Duration,
    pub cors_origins: Vec<String>,
}

impl GateConfig {
    pub fn from_args(args: GateArgs) -> Result<Self> {
        let auth_service_url = args
            .auth_service_url
            .context("AUTH_SERVICE_URL is not set")?;

        let config = Self {
            bind_addr: args.bind,
            auth_service_url,
            validate_timeout: Duration::from_millis(args.validate_timeout_ms),
            cors_origins: clean_origins(args.cors_origins),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.auth_service_url.starts_with("http://")
            || self.auth_service_url.starts_with("https://"))
        {
            bail!("AUTH_SERVICE_URL must be an http(s) URL");
        }
        if self.validate_timeout.is_zero() {
            bail!("GATE_VALIDATE_TIMEOUT_MS must be positive");
        }
        Ok(())
    }
}

fn clean_origins(origins: Vec<String>) -> Vec<String> {
    origins
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

/// Load `.env` from the working directory (and parents), then the crate root.
pub fn load_env() {
    let _ = dotenv::dotenv();

    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
