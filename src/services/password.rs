//! Argon2id password hashing.
//!
//! Hashing and verification are CPU-bound, so both run on the blocking pool.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::config::SecurityConfig;

#[derive(Debug, Clone)]
pub struct PasswordService {
    memory_cost_kib: u32,
    time_cost: u32,
    parallelism: u32,
}

impl PasswordService {
    #[must_use]
    pub const fn new(config: &SecurityConfig) -> Self {
        Self {
            memory_cost_kib: config.argon2_memory_cost_kib,
            time_cost: config.argon2_time_cost,
            parallelism: config.argon2_parallelism,
        }
    }

    fn params(&self) -> Result<Params> {
        Params::new(self.memory_cost_kib, self.time_cost, self.parallelism, None)
            .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))
    }

    /// Produces a PHC string with a fresh random salt.
    pub async fn hash(&self, password: &str) -> Result<String> {
        let params = self.params()?;
        let password = password.to_string();

        task::spawn_blocking(move || hash_with_params(&password, params))
            .await
            .context("Password hashing task panicked")?
    }

    /// Fails closed: a malformed digest or a crashed worker is a mismatch.
    pub async fn verify(&self, password: &str, digest: &str) -> bool {
        let password = password.to_string();
        let digest = digest.to_string();

        match task::spawn_blocking(move || verify_digest(&password, &digest)).await {
            Ok(valid) => valid,
            Err(e) => {
                tracing::error!(error = %e, "Password verification task failed");
                false
            }
        }
    }

    /// True when the stored digest was produced with other Argon2 settings.
    #[must_use]
    pub fn needs_rehash(&self, digest: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            return true;
        };

        if parsed.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }

        match Params::try_from(&parsed) {
            Ok(stored) => {
                stored.m_cost() != self.memory_cost_kib
                    || stored.t_cost() != self.time_cost
                    || stored.p_cost() != self.parallelism
            }
            Err(_) => true,
        }
    }
}

fn hash_with_params(password: &str, params: Params) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

fn verify_digest(password: &str, digest: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(digest) else {
        return false;
    };

    // Verification reads the parameters from the digest itself.
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
