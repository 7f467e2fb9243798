use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::TokenError;

/// Hash `password` with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, TokenError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| TokenError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn check_password(password: &str, hashed_password: &str) -> Result<(), TokenError> {
    let parsed = PasswordHash::new(hashed_password).map_err(|e| TokenError::Hashing(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| TokenError::PasswordMismatch)
}
