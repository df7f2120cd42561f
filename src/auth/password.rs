use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::{MarketError, MarketResult};

fn internal(context: &str, e: password_hash::Error) -> MarketError {
    error!(error = %e, "{context}");
    MarketError::Internal(format!("{context}: {e}"))
}

/// PHC string with a fresh random salt.
pub fn hash_password(plain: &str) -> MarketResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| internal("argon2 hash failed", e))
}

/// `Ok(false)` for a wrong password; an unparsable stored hash is an
/// internal error, never a credential failure.
pub fn verify_password(plain: &str, hash: &str) -> MarketResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| internal("stored password hash is malformed", e))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
