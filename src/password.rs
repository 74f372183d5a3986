use pbkdf2::{
    Params, Pbkdf2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand_core::OsRng;

use crate::error::AppError;

/// Derived key length in bytes (SHA-256 output size).
const OUTPUT_LENGTH: usize = 32;

/// hash_password
///
/// Hashes `password` with PBKDF2-HMAC-SHA256 under a fresh random salt and returns the PHC
/// string (`$pbkdf2-sha256$i=<rounds>,l=32$<salt>$<hash>`). The iteration count is embedded,
/// so changing `rounds` later does not invalidate stored hashes.
pub fn hash_password(password: &str, rounds: u32) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let params = Params {
        rounds,
        output_length: OUTPUT_LENGTH,
    };
    let hash = Pbkdf2
        .hash_password_customized(password.as_bytes(), None, None, params, &salt)
        .map_err(|e| AppError::Password(e.to_string()))?;
    Ok(hash.to_string())
}

/// verify_password
///
/// Recomputes the hash with the parameters stored in `stored_hash` and compares outputs in
/// constant time. A malformed stored hash verifies nothing.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::error!("stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Runs [`hash_password`] off the async executor.
pub async fn hash_password_blocking(password: String, rounds: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password, rounds))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
}

/// Runs [`verify_password`] off the async executor.
pub async fn verify_password_blocking(password: String, stored_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// verify_login
///
/// Checks `password` against an account's stored hash. With no account, a throwaway hash
/// at `rounds` is derived instead so an unknown username costs the same PBKDF2 work as a
/// known one, and the result is always `false`.
pub async fn verify_login(
    password: String,
    stored_hash: Option<String>,
    rounds: u32,
) -> Result<bool, AppError> {
    match stored_hash {
        Some(hash) => verify_password_blocking(password, hash).await,
        None => {
            hash_password_blocking(password, rounds).await?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn login_without_account_never_verifies() {
        assert!(!verify_login("admin123".to_string(), None, 1_000).await.unwrap());
        assert!(!verify_login(String::new(), None, 1_000).await.unwrap());
    }

    #[tokio::test]
    async fn login_with_account_checks_stored_hash() {
        let hash = hash_password("admin123", 1_000).unwrap();
        assert!(verify_login("admin123".to_string(), Some(hash.clone()), 1_000).await.unwrap());
        assert!(!verify_login("admin12".to_string(), Some(hash), 1_000).await.unwrap());
    }

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = hash_password("admin123", 1_000).unwrap();
        assert!(hash.starts_with("$pbkdf2-sha256$"));
        assert!(verify_password("admin123", &hash));
        assert!(!verify_password("admin124", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("secret", 1_000).unwrap();
        let b = hash_password("secret", 1_000).unwrap();
        assert_ne!(a, b);
        assert!(verify_password("secret", &a));
        assert!(verify_password("secret", &b));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("admin123", "admin123"));
        assert!(!verify_password("admin123", ""));
    }
}
