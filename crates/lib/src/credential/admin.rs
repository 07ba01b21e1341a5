//! Administrator password gate
//!
//! The administrator password is configuration, not a stored credential. It is
//! hashed once with Argon2id when the gate is built so the plaintext does not
//! stay in memory for the life of the server.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core},
};

use super::errors::CredentialError;
use crate::Result;

/// Verifies login attempts against the configured administrator password.
#[derive(Clone)]
pub struct AdminGate {
    /// Argon2 hash string (PHC format)
    password_hash: String,
}

impl AdminGate {
    /// Build a gate from the configured plaintext password.
    pub fn new(password: impl AsRef<str>) -> Result<Self> {
        let password = password.as_ref();
        if password.is_empty() {
            return Err(CredentialError::EmptyField { field: "admin password" }.into());
        }

        let salt = SaltString::generate(&mut rand_core::OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| CredentialError::HashingFailed {
                reason: format!("Admin password hashing failed: {e}"),
            })?
            .to_string();

        Ok(Self { password_hash })
    }

    /// Check a login attempt.
    pub fn verify(&self, attempt: impl AsRef<str>) -> Result<()> {
        let parsed = PasswordHash::new(&self.password_hash).map_err(|e| {
            CredentialError::HashingFailed {
                reason: format!("Stored admin hash is unreadable: {e}"),
            }
        })?;

        Argon2::default()
            .verify_password(attempt.as_ref().as_bytes(), &parsed)
            .map_err(|_| CredentialError::InvalidPassword.into())
    }
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate").finish_non_exhaustive()
    }
}
