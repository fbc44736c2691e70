//! Password Verifiers
//! Mission: Derive and check salted password verifiers with a memory-hard KDF

use argon2::{Algorithm, Argon2, Params, Version};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

/// Salt length in bytes (hex-encoded to twice this in storage)
pub const SALT_LEN: usize = 16;

/// Verifier length in bytes
const VERIFIER_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid KDF parameters: {0}")]
    InvalidParams(String),
    #[error("salt is not valid hex")]
    InvalidSalt,
    #[error("key derivation failed: {0}")]
    Derivation(String),
}

/// The two-function contract callers depend on. `derive` and `verify` must
/// belong to the same KDF family so the scheme can be swapped in one place.
pub trait VerifierScheme: Send + Sync {
    fn derive(&self, password: &str, salt: &str) -> Result<String, PasswordError>;

    fn verify(&self, password: &str, salt: &str, verifier: &str) -> bool {
        match self.derive(password, salt) {
            Ok(candidate) => constant_time_eq(candidate.as_bytes(), verifier.as_bytes()),
            Err(_) => false,
        }
    }
}

/// Argon2 work factors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub m_cost_kib: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost_kib: Params::DEFAULT_M_COST,
            t_cost: Params::DEFAULT_T_COST,
            p_cost: Params::DEFAULT_P_COST,
        }
    }
}

/// Argon2id verifier scheme
pub struct Argon2Scheme {
    params: Params,
}

impl Argon2Scheme {
    pub fn new(kdf: KdfParams) -> Result<Self, PasswordError> {
        let params = Params::new(kdf.m_cost_kib, kdf.t_cost, kdf.p_cost, Some(VERIFIER_LEN))
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }
}

impl VerifierScheme for Argon2Scheme {
    fn derive(&self, password: &str, salt: &str) -> Result<String, PasswordError> {
        let salt_bytes = hex::decode(salt).map_err(|_| PasswordError::InvalidSalt)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let mut out = [0u8; VERIFIER_LEN];
        argon2
            .hash_password_into(password.as_bytes(), &salt_bytes, &mut out)
            .map_err(|e| PasswordError::Derivation(e.to_string()))?;

        Ok(hex::encode(out))
    }
}

/// Fresh random salt, hex-encoded
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
pub(crate) fn fast_scheme() -> Argon2Scheme {
    Argon2Scheme::new(KdfParams {
        m_cost_kib: 64,
        t_cost: 1,
        p_cost: 1,
    })
    .unwrap()
}
