//! Password hashing with Argon2
//!
//! New hashes are Argon2id PHC strings whose time cost is the configured work
//! factor. Stored bcrypt hashes (`$2a$`, `$2b$`, `$2y$`) from accounts created
//! before the move to Argon2id still verify, and [`needs_rehash`] flags them
//! so login can upgrade them.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Lowest accepted work factor
pub const MIN_COST: u32 = 1;
/// Highest accepted work factor
pub const MAX_COST: u32 = 31;
/// Work factor used when none is configured
pub const DEFAULT_COST: u32 = 12;

const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

fn hasher(cost: u32) -> Result<Argon2<'static>, PasswordError> {
    if !(MIN_COST..=MAX_COST).contains(&cost) {
        return Err(PasswordError::Hashing(format!(
            "cost {cost} outside supported range {MIN_COST}..={MAX_COST}"
        )));
    }

    let params = Params::new(Params::DEFAULT_M_COST, cost, Params::DEFAULT_P_COST, None)
        .map_err(|e| PasswordError::Hashing(e.to_string()))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password using Argon2id with a fresh random salt
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let argon2 = hasher(cost)?;
    let salt = SaltString::generate(&mut OsRng);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// A hash of a random secret at `cost`.
///
/// Login verifies against it when no usable account matches, so unknown
/// emails take as long to reject as wrong passwords.
pub fn decoy_hash(cost: u32) -> Result<String, PasswordError> {
    let secret = SaltString::generate(&mut OsRng);
    hash_password(secret.as_str(), cost)
}

/// Verify a password against a stored hash.
///
/// Any mismatch, including a stored value that is not a recognised hash,
/// yields `false`. Digest comparison is constant time in both backends.
pub fn verify_password(password: &str, stored: &str) -> bool {
    if is_bcrypt_hash(stored) {
        return bcrypt::verify(password, stored).unwrap_or(false);
    }

    let Ok(parsed_hash) = PasswordHash::new(stored) else {
        return false;
    };

    // Parameters are read back out of the PHC string
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Whether a stored hash should be replaced by a fresh one at `cost`
pub fn needs_rehash(stored: &str, cost: u32) -> bool {
    if is_bcrypt_hash(stored) {
        return true;
    }

    let Ok(parsed_hash) = PasswordHash::new(stored) else {
        return true;
    };
    if parsed_hash.algorithm != argon2::ARGON2ID_IDENT {
        return true;
    }

    match Params::try_from(&parsed_hash) {
        Ok(params) => params.t_cost() != cost,
        Err(_) => true,
    }
}

fn is_bcrypt_hash(stored: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"]
        .iter()
        .any(|prefix| stored.starts_with(prefix))
}

/// Validate password length for new credentials
pub fn validate_password_strength(password: &str) -> Result<(), PasswordValidationError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(PasswordValidationError::TooShort);
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(PasswordValidationError::TooLong);
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PasswordValidationError {
    #[error("Password must be at least 8 characters")]
    TooShort,
    #[error("Password must be at most 128 characters")]
    TooLong,
}
