//! API handlers and shared request-validation helpers.

pub mod auth;
pub mod health;
pub mod me;

use regex::Regex;
use std::time::SystemTime;

/// Lightweight email sanity check used by auth handlers before any store call.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Password length bounds; strength policy beyond length is the caller's job.
pub fn valid_password(password: &str) -> bool {
    (8..=128).contains(&password.len())
}

/// Unix seconds for token validation.
pub(crate) fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_simple() {
        assert!(valid_email("user@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("spaces in@example.com"));
    }

    #[test]
    fn valid_password_enforces_length_bounds() {
        assert!(valid_password("Secret123"));
        assert!(valid_password(&"a".repeat(8)));
        assert!(valid_password(&"a".repeat(128)));
        assert!(!valid_password("short"));
        assert!(!valid_password(&"a".repeat(129)));
    }

    #[test]
    fn now_unix_seconds_is_positive() {
        assert!(now_unix_seconds() > 0);
    }
}
