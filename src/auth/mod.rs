//! Authentication
//!
//! Password hashing, one-time codes and signed session tokens.

pub mod otp;
pub mod password;
pub mod token;

pub use otp::{generate_code, hash_code};
pub use password::{hash_password, verify_password, PasswordError};
pub use token::{Claims, TokenError, TokenService};

/// Canonical form of a phone number: surrounding whitespace, inner spaces and
/// dashes removed. Returns `None` unless what remains is 7 to 15 digits with
/// an optional leading `+`.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let phone: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();

    let digits = phone.strip_prefix('+').unwrap_or(&phone);
    let valid = (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());

    valid.then_some(phone)
}
