//! Password strength policy and salted Argon2id hashing.
//!
//! Cleartext passwords never leave this module: callers hand a password in
//! and get a PHC-format hash string back, or a yes/no on verification.

use std::sync::OnceLock;

use anyhow::anyhow;
use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::error::BurnoutError;

pub const PASSWORD_RULES: &str = "Password must be at least 8 characters long and include an \
     uppercase letter, lowercase letter, number, and special character.";

/// Symbols that satisfy the "special character" rule.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";

const MIN_PASSWORD_LEN: usize = 8;

/// Hashed once per hasher and verified against when a login names no account.
const DECOY_PASSWORD: &str = "decoy-Password-1!";

pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

pub fn ensure_strong_password(password: &str) -> Result<(), BurnoutError> {
    if is_strong_password(password) {
        Ok(())
    } else {
        Err(BurnoutError::WeakPassword)
    }
}

/// Argon2id hasher. `Default` uses the crate's recommended parameters.
#[derive(Clone, Default)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    decoy: OnceLock<String>,
}

impl CredentialHasher {
    /// Build with explicit cost parameters (memory KiB, iterations, lanes).
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, BurnoutError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| anyhow!("invalid argon2 parameters: {e}"))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            decoy: OnceLock::new(),
        })
    }

    pub fn hash(&self, password: &str) -> Result<String, BurnoutError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow!("password hashing failed: {e}"))?;
        Ok(hash.to_string())
    }

    /// A stored hash that cannot be parsed verifies as false.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Verification for a login whose account does not exist. Runs a full
    /// Argon2 check against a decoy hash so the response takes as long as a
    /// wrong password would, then fails.
    pub fn verify_missing(&self, password: &str) -> bool {
        let decoy = self
            .decoy
            .get_or_init(|| self.hash(DECOY_PASSWORD).unwrap_or_default());
        let _ = self.verify(password, decoy);
        false
    }
}
