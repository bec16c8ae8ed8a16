//! Password hashing and verification.
//!
//! New hashes are Argon2id PHC strings. Verification also accepts bcrypt
//! hashes so records provisioned with bcrypt (cost 10) keep working.
//!
//! An unknown username is charged one verification against an Argon2id dummy
//! built with the same parameters as [`hash_password`]. The two failure paths
//! therefore cost the same only while the stored record is an Argon2id hash
//! from this module. A bcrypt record verifies in a different time, so its
//! existence stays observable by timing until it is rehashed with
//! `hiregate create-admin --force`.

use argon2::password_hash::{self, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::rngs::OsRng;
use std::sync::LazyLock;
use tokio::task::JoinError;

// OWASP baseline for Argon2id: 19 MiB, 2 iterations, 1 lane.
const MEMORY_COST_KIB: u32 = 19 * 1024;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;

// Verified when the username does not exist, so both failure paths pay for one hash check.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("hiregate-dummy-password").ok());

fn argon2_config() -> Result<Argon2<'static>, password_hash::Error> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password with Argon2id and a fresh random salt.
///
/// # Errors
/// Returns an error if the Argon2 parameters or the salt are rejected.
pub fn hash_password(plaintext: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = argon2_config()?;
    Ok(argon2.hash_password(plaintext.as_bytes(), &salt)?.to_string())
}

/// Check a plaintext password against a stored hash.
///
/// Unparseable hashes never match. Comparison is delegated to the hashing
/// crates, which compare digests in constant time.
#[must_use]
pub fn verify(plaintext: &str, stored_hash: &str) -> bool {
    if is_bcrypt(stored_hash) {
        return bcrypt::verify(plaintext, stored_hash).unwrap_or(false);
    }

    let Ok(parsed_hash) = PasswordHash::new(stored_hash) else {
        return false;
    };
    // Parameters come from the PHC string, so any Argon2 variant verifies.
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Run [`verify`] on the blocking pool; hashing is deliberately slow.
///
/// # Errors
/// Returns an error if the blocking task panics or is cancelled.
pub async fn verify_blocking(plaintext: String, stored_hash: String) -> Result<bool, JoinError> {
    tokio::task::spawn_blocking(move || verify(&plaintext, &stored_hash)).await
}

/// Burn one verification against a dummy hash and discard the result.
///
/// # Errors
/// Returns an error if the blocking task panics or is cancelled.
pub async fn equalize_timing(plaintext: String) -> Result<(), JoinError> {
    tokio::task::spawn_blocking(move || {
        if let Some(hash) = DUMMY_HASH.as_deref() {
            let _ = verify(&plaintext, hash);
        }
    })
    .await
}

fn is_bcrypt(hash: &str) -> bool {
    ["$2a$", "$2b$", "$2x$", "$2y$"]
        .iter()
        .any(|prefix| hash.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn argon2_hash_verifies() -> Result<()> {
        let hash = hash_password("MySecurePass123!").map_err(|err| anyhow::anyhow!("{err}"))?;
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify("MySecurePass123!", &hash));
        assert!(!verify("MySecurePass123?", &hash));
        Ok(())
    }

    #[test]
    fn hashes_are_salted() -> Result<()> {
        let first = hash_password("same-password").map_err(|err| anyhow::anyhow!("{err}"))?;
        let second = hash_password("same-password").map_err(|err| anyhow::anyhow!("{err}"))?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn bcrypt_hash_verifies() -> Result<()> {
        let hash = bcrypt::hash("MySecurePass123!", 4)?;
        assert!(verify("MySecurePass123!", &hash));
        assert!(!verify("wrong-password", &hash));
        Ok(())
    }

    #[test]
    fn garbage_hash_never_matches() {
        assert!(!verify("anything", ""));
        assert!(!verify("anything", "not-a-hash"));
        assert!(!verify("anything", "$2b$10$truncated"));
    }

    #[test]
    fn dummy_hash_uses_provisioning_parameters() -> Result<()> {
        let dummy = DUMMY_HASH
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("dummy hash unavailable"))?;
        let fresh = hash_password("anything").map_err(|err| anyhow::anyhow!("{err}"))?;
        let params = |hash: &str| -> Option<String> {
            let parsed = PasswordHash::new(hash).ok()?;
            Some(format!("{}${:?}${}", parsed.algorithm, parsed.version, parsed.params))
        };
        assert!(params(dummy).is_some());
        assert_eq!(params(dummy), params(&fresh));
        Ok(())
    }

    #[tokio::test]
    async fn verify_blocking_matches_sync_result() -> Result<()> {
        let hash = hash_password("correct-horse").map_err(|err| anyhow::anyhow!("{err}"))?;
        assert!(verify_blocking("correct-horse".to_string(), hash.clone()).await?);
        assert!(!verify_blocking("battery-staple".to_string(), hash).await?);
        equalize_timing("whatever".to_string()).await?;
        Ok(())
    }
}
