//! Credential hashing
//!
//! One-way bcrypt hashing for passwords and OTP codes. The digest is
//! self-contained (salt and cost are embedded in the modular-crypt string),
//! so verification needs no external state. The work factor comes from
//! `Config::bcrypt_cost`; 12 in deployments, lower in tests.

use bcrypt::BcryptError;

/// Hash a secret with the given bcrypt cost.
pub fn hash_secret(secret: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(secret, cost)
}

/// Verify a secret against a stored digest.
pub fn verify_secret(secret: &str, digest: &str) -> Result<bool, BcryptError> {
    bcrypt::verify(secret, digest)
}
