//! Player accounts and password hashing.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::info;

use crate::error::SessionError;

use super::store::AccountStore;

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a password against a stored hash. `Ok(false)` on mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Create an account. Fails with `DuplicateKey` if the name is taken.
pub fn register<S: AccountStore>(
    store: &S,
    username: &str,
    password: &str,
) -> Result<(), SessionError> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(SessionError::AuthFailure);
    }
    let hash = hash_password(password)?;
    store.create_account(username, &hash)?;
    info!("registered account {username}");
    Ok(())
}

/// Verify credentials. Unknown users and wrong passwords both yield
/// `AuthFailure`.
pub fn login<S: AccountStore>(store: &S, username: &str, password: &str) -> Result<(), SessionError> {
    let Some(hash) = store.password_hash(username)? else {
        return Err(SessionError::AuthFailure);
    };
    if verify_password(password, &hash)? {
        Ok(())
    } else {
        Err(SessionError::AuthFailure)
    }
}
