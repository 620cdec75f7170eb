use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

#[derive(Debug, thiserror::Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(String);

/// Hash `plain` with argon2id and a fresh random salt.
pub fn hash_password(plain: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            HashError(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Check `plain` against a stored hash.
///
/// Only a malformed stored hash is an error; a mismatch is `Ok(false)`.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, HashError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        HashError(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(plain: String) -> Result<String, HashError> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .map_err(|e| HashError(e.to_string()))?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(plain: String, hash: String) -> Result<bool, HashError> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .map_err(|e| HashError(e.to_string()))?
}
