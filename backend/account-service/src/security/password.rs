/// Password hashing and verification using Argon2id
use crate::error::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use zxcvbn::zxcvbn;

/// Minimum zxcvbn score accepted for new passwords
const MIN_STRENGTH_SCORE: u8 = 3;

/// Hash a password with Argon2id and a fresh random salt.
/// Enforces strength before hashing.
pub fn hash_password(password: &str) -> Result<String> {
    validate_password_strength(password)?;

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored PHC-formatted hash
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| AppError::Internal(format!("Invalid stored password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn validate_password_strength(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let estimate = zxcvbn(password, &[])
        .map_err(|e| AppError::Internal(format!("Password strength check failed: {}", e)))?;

    if estimate.score() < MIN_STRENGTH_SCORE {
        return Err(AppError::Validation(
            "Password is too weak, choose a longer or less predictable one".to_string(),
        ));
    }

    Ok(())
}
