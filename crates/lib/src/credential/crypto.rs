//! Password hashing for the credential system
//!
//! Family passwords are stretched with PBKDF2-HMAC-SHA256. Every call to
//! [`hash_password`] draws a fresh salt, and the iteration count is stored next
//! to the hash so older rows keep verifying if the default ever changes.

use base64ct::{Base64, Encoding};
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;
use zeroize::Zeroize;

use super::errors::CredentialError;
use crate::Result;

/// Salt length in bytes
pub const SALT_LENGTH: usize = 16;

/// Derived key length in bytes
pub const KEY_LENGTH: usize = 32;

/// Iteration count applied to newly hashed passwords
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Output of [`hash_password`]: everything needed to verify later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashedPassword {
    /// Base64 encoded derived key
    pub hash: String,
    /// Base64 encoded salt
    pub salt: String,
    /// PBKDF2 iteration count used for this hash
    pub iterations: u32,
}

/// Hash a password with a fresh random salt and the default iteration count.
pub fn hash_password(password: impl AsRef<str>) -> HashedPassword {
    let mut salt = [0u8; SALT_LENGTH];
    OsRng.fill_bytes(&mut salt);
    derive(password.as_ref(), &salt, DEFAULT_ITERATIONS)
}

/// Hash a password with a fresh random salt and an explicit iteration count.
pub fn hash_password_with_iterations(
    password: impl AsRef<str>,
    iterations: u32,
) -> Result<HashedPassword> {
    if iterations == 0 {
        return Err(CredentialError::InvalidIterations { iterations }.into());
    }
    let mut salt = [0u8; SALT_LENGTH];
    OsRng.fill_bytes(&mut salt);
    Ok(derive(password.as_ref(), &salt, iterations))
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> HashedPassword {
    let mut key = [0u8; KEY_LENGTH];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    let hash = Base64::encode_string(&key);
    key.zeroize();

    HashedPassword {
        hash,
        salt: Base64::encode_string(salt),
        iterations,
    }
}

/// Verify a password against a stored hash, salt and iteration count.
///
/// Returns false for malformed stored values rather than erroring: a corrupt
/// row must never unlock anything.
pub fn verify_password(
    password: impl AsRef<str>,
    stored_hash: impl AsRef<str>,
    salt: impl AsRef<str>,
    iterations: u32,
) -> bool {
    if iterations == 0 {
        return false;
    }
    let Ok(salt) = Base64::decode_vec(salt.as_ref()) else {
        return false;
    };
    let Ok(expected) = Base64::decode_vec(stored_hash.as_ref()) else {
        return false;
    };

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_ref().as_bytes(), &salt, iterations, &mut key);
    let matches = constant_time_eq(&key, &expected);
    key.zeroize();
    matches
}

/// Constant-time byte comparison.
///
/// Unequal lengths return false immediately; the derived key length is fixed,
/// so the length itself leaks nothing.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
