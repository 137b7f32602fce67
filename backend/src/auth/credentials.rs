use anyhow::{Result, anyhow};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").expect("email pattern compiles"));

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Returns every rule the password breaks; empty when it is acceptable.
pub fn password_violations(password: &str) -> Vec<&'static str> {
    let mut violations = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LEN {
        violations.push("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        violations.push("Password must include a lowercase letter");
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        violations.push("Password must include an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push("Password must include a number");
    }
    if !password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
        violations.push("Password must include a special character");
    }

    violations
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;

    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(password_hash).map_err(|err| anyhow!("stored hash is invalid: {err}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_addresses() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("j.doe+gym@mail.example.co"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        for email in ["", "jane", "jane@", "jane@example", "jane@example.c", "ja ne@example.com"] {
            assert!(!is_valid_email(email), "{email} should be rejected");
        }
    }

    #[test]
    fn strong_password_has_no_violations() {
        assert!(password_violations("Secret#123").is_empty());
    }

    #[test]
    fn weak_password_lists_every_broken_rule() {
        let violations = password_violations("abc");

        assert_eq!(
            violations,
            vec![
                "Password must be at least 8 characters long",
                "Password must include an uppercase letter",
                "Password must include a number",
                "Password must include a special character",
            ]
        );
    }

    #[test]
    fn hash_round_trips() {
        let hash = hash_password("Secret#123").unwrap();

        assert_ne!(hash, "Secret#123");
        assert!(verify_password("Secret#123", &hash).unwrap());
        assert!(!verify_password("Secret#124", &hash).unwrap());
    }
}
