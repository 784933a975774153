//! Password Hashing
//!
//! Argon2id with a random salt, stored as a PHC string.

use std::time::Duration;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::error::{AuthError, AuthResult};

/// Hash a password.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Check a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash on the blocking pool, bounded by `limit`.
pub async fn hash_password_bounded(password: String, limit: Duration) -> AuthResult<String> {
    let task = tokio::task::spawn_blocking(move || hash_password(&password));
    match tokio::time::timeout(limit, task).await {
        Ok(Ok(Ok(hash))) => Ok(hash),
        Ok(Ok(Err(e))) => {
            tracing::error!(error = %e, "Password hashing failed");
            Err(AuthError::PasswordHash)
        }
        Ok(Err(e)) => Err(AuthError::Internal(format!("hash task failed: {e}"))),
        Err(_) => {
            tracing::warn!(limit_secs = limit.as_secs(), "Password hashing timed out");
            Err(AuthError::PasswordHash)
        }
    }
}

/// Verify on the blocking pool, bounded by `limit`.
pub async fn verify_password_bounded(
    password: String,
    hash: String,
    limit: Duration,
) -> AuthResult<bool> {
    let task = tokio::task::spawn_blocking(move || verify_password(&password, &hash));
    match tokio::time::timeout(limit, task).await {
        Ok(Ok(Ok(valid))) => Ok(valid),
        Ok(Ok(Err(e))) => {
            tracing::error!(error = %e, "Stored password hash is malformed");
            Err(AuthError::PasswordHash)
        }
        Ok(Err(e)) => Err(AuthError::Internal(format!("verify task failed: {e}"))),
        Err(_) => {
            tracing::warn!(limit_secs = limit.as_secs(), "Password verification timed out");
            Err(AuthError::PasswordHash)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("x", "not-a-phc-string").is_err());
    }

    #[tokio::test]
    async fn test_bounded_helpers() {
        let limit = Duration::from_secs(5);
        let hash = hash_password_bounded("password1".into(), limit).await.unwrap();
        assert!(verify_password_bounded("password1".into(), hash.clone(), limit)
            .await
            .unwrap());
        assert!(!verify_password_bounded("password2".into(), hash, limit)
            .await
            .unwrap());
    }
}
