//! Password hashing and verification utilities
//!
//! This module provides salted password hashing using bcrypt and the
//! verification counterpart for authentication callers.

use tracing::{debug, error};

/// bcrypt work factor applied to every new hash
pub const BCRYPT_COST: u32 = 10;

/// Error types for password operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),
    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),
    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

pub trait PasswordUtils {
    /// Hashes the given password with bcrypt, salted per call
    fn hash_password(password: &str) -> Result<String, PasswordError>;

    /// Verifies the given password against the stored hash
    fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError>;
}

pub struct PasswordUtilsImpl;

impl PasswordUtils for PasswordUtilsImpl {

    fn hash_password(password: &str) -> Result<String, PasswordError> {
        debug!("Hashing password");

        match bcrypt::hash(password, BCRYPT_COST) {
            Ok(hash) => {
                debug!("Password successfully hashed");
                Ok(hash)
            }
            Err(err) => {
                error!("Failed to hash password: {}", err);
                Err(PasswordError::HashingFailed(err.to_string()))
            }
        }
    }

    fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
        debug!("Verifying password against stored hash");

        match bcrypt::verify(password, hash) {
            Ok(matches) => {
                debug!("Password verification completed: {}", matches);
                Ok(matches)
            }
            Err(bcrypt::BcryptError::InvalidHash(err)) => {
                error!("Invalid password hash format: {}", err);
                Err(PasswordError::InvalidHashFormat)
            }
            Err(err) => {
                error!("Password verification error: {}", err);
                Err(PasswordError::VerificationFailed(err.to_string()))
            }
        }
    }
}
