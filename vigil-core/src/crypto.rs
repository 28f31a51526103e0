//! Random identifiers and secure token handling.
//!
//! Two families of values are generated here: prefixed entity IDs (`acct_…`)
//! and single-use token values for verification and password-reset links.
//! Token values are never persisted in plaintext; stores keep a SHA256 hash
//! and look tokens up by that hash. Verification against a stored hash uses
//! constant-time comparison via the `subtle` crate so a mismatch position is
//! not observable through timing.
//!
//! SHA256 (rather than a password KDF) is sufficient because token values
//! carry 256 bits of CSPRNG entropy, which is not brute-forceable.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generate a single-use token value with 256 bits of entropy.
///
/// The value is URL-safe base64 without padding (43 characters), suitable for
/// embedding in a verification or password-reset link.
///
/// # Panics
///
/// Panics if the OS random number generator fails. This indicates a critical
/// system failure from which recovery is not possible for security-sensitive
/// operations.
pub fn generate_token_value() -> String {
    let mut bytes = [0u8; 32]; // 256 bits of entropy
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a token value for storage and lookup.
///
/// Returns a hex-encoded SHA256 digest. Deterministic, so the hash doubles as
/// the database lookup key.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a candidate token value against a stored hash in constant time.
pub fn verify_token_hash(token: &str, stored_hash: &str) -> bool {
    let computed_hash = hash_token(token);
    constant_time_compare(computed_hash.as_bytes(), stored_hash.as_bytes())
}

/// Constant-time equality for byte slices of equal length.
///
/// Unequal lengths return `false` immediately; length is not a secret here.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Generate a prefixed ID with 96 bits of entropy, e.g. `acct_dGVzdHRlc3R0ZXN0`.
pub fn generate_prefixed_id(prefix: &str) -> String {
    let mut bytes = [0u8; 12]; // 96 bits
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");
    let encoded = BASE64_URL_SAFE_NO_PAD.encode(bytes);
    format!("{prefix}_{encoded}")
}

/// Check that an ID carries the expected prefix and enough entropy.
pub fn validate_prefixed_id(id: &str, expected_prefix: &str) -> bool {
    let Some(random_part) = id
        .strip_prefix(expected_prefix)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };

    match BASE64_URL_SAFE_NO_PAD.decode(random_part) {
        Ok(decoded) => decoded.len() >= 12, // at least 96 bits
        Err(_) => false,
    }
}
