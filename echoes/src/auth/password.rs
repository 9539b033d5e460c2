//! Password hashing and verification.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use base64::{engine::general_purpose, Engine as _};
use rand::{thread_rng, Rng};

use crate::errors::Error;

/// Argon2id parameters (RFC recommendations: 19 MB memory, 2 iterations).
fn argon2() -> Result<Argon2<'static>, Error> {
    let params = Params::new(19456, 2, 1, None).map_err(|e| Error::Internal {
        operation: format!("create argon2 params: {e}"),
    })?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a string using Argon2 (used for passwords and reset tokens).
pub fn hash_string(input: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2()?.hash_password(input.as_bytes(), &salt).map_err(|e| Error::Internal {
        operation: format!("hash string: {e}"),
    })?;

    Ok(hash.to_string())
}

/// Verify a string against a hash.
///
/// Note: Verification uses the parameters embedded in the hash itself.
pub fn verify_string(input: &str, hash: &str) -> Result<bool, Error> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| Error::Internal {
        operation: format!("parse hash: {e}"),
    })?;

    Ok(Argon2::default().verify_password(input.as_bytes(), &parsed_hash).is_ok())
}

/// Generate a secure random token for password reset
pub fn generate_reset_token() -> String {
    // 32 bytes (256 bits) of cryptographically secure random data
    let mut token_bytes = [0u8; 32];
    thread_rng().fill(&mut token_bytes);

    // Encode as base64url without padding
    general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Charset excludes ambiguous characters (I/l, O/0) since provisioned
/// credentials occasionally get read aloud or typed from a screen.
const TEMP_PASSWORD_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789!@#$%";
const TEMP_PASSWORD_LENGTH: usize = 24;

/// Generate a random temporary password for provisioned staff accounts. The
/// account holder never uses it directly; it exists so the row has a
/// credential until the password-reset email is acted on.
pub fn generate_temp_password() -> String {
    let mut rng = thread_rng();
    (0..TEMP_PASSWORD_LENGTH)
        .map(|_| TEMP_PASSWORD_CHARS[rng.gen_range(0..TEMP_PASSWORD_CHARS.len())] as char)
        .collect()
}
