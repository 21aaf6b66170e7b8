//! One-time login codes

use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a 6-digit code.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
}

/// Hex sha256 of a code, bound to the phone it was issued for.
pub fn hash_code(phone: &str, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(phone.as_bytes());
    hasher.update(b":");
    hasher.update(code.trim().as_bytes());
    hex::encode(hasher.finalize())
}
