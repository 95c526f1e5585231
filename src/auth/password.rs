use std::sync::Arc;

use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::config::HashConfig;

/// Argon2 hashing offloaded to the blocking pool, at most `workers` at a time.
#[derive(Clone)]
pub struct CredentialStore {
    argon2: Argon2<'static>,
    permits: Arc<Semaphore>,
}

impl CredentialStore {
    pub fn new(cfg: &HashConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            permits: Arc::new(Semaphore::new(cfg.workers.max(1))),
        })
    }

    pub async fn hash(&self, plain: String) -> anyhow::Result<String> {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .context("hash worker pool closed")?;
        let argon2 = self.argon2.clone();
        tokio::task::spawn_blocking(move || hash_password(&argon2, &plain))
            .await
            .context("hash worker panicked")?
    }

    pub async fn verify(&self, plain: String, hash: String) -> anyhow::Result<bool> {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .context("hash worker pool closed")?;
        let argon2 = self.argon2.clone();
        let ok = tokio::task::spawn_blocking(move || verify_password(&argon2, &plain, &hash))
            .await
            .context("hash worker panicked")?;
        Ok(ok)
    }

    /// Same cost as `verify`, for logins whose account does not exist.
    pub async fn verify_absent(&self, plain: String) -> anyhow::Result<bool> {
        self.hash(plain).await?;
        Ok(false)
    }
}

pub fn hash_password(argon2: &Argon2<'_>, plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Malformed or empty stored hashes never match.
pub fn verify_password(argon2: &Argon2<'_>, plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            debug!(error = %e, "stored hash is not a valid PHC string");
            return false;
        }
    };
    argon2.verify_password(plain.as_bytes(), &parsed).is_ok()
}

#[cfg(test)]
pub(crate) fn cheap_hash_config() -> HashConfig {
    HashConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
        workers: 2,
    }
}
