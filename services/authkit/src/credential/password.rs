//! One-way password hashing and verification.
//!
//! Argon2id with default cost parameters; the salt is embedded in the PHC
//! output string so verification needs no separate lookup. Verification is a
//! plain bool: malformed hashes and wrong passwords are indistinguishable to
//! callers, and the comparison itself is constant-time inside the verifier.

use anyhow::{anyhow, Result};
use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;

/// Hash a plaintext password into a PHC string.
///
/// # Errors
///
/// Returns an error if the hasher rejects its parameters; this does not
/// depend on the password value.
pub fn hash(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Verify a plaintext password against a stored PHC string.
///
/// Never errors upward: a hash that fails to parse verifies false, the same
/// as a wrong password.
#[must_use]
pub fn verify(plaintext: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
