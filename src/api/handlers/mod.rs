//! Route handlers and the request validation they share.

pub mod health;
pub mod otp;

use regex::Regex;

/// Normalize an email for directory lookups.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(crate) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Treat blank optional strings as absent.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Alice@Example.COM \n"), "alice@example.com");
    }

    #[test]
    fn email_shape() {
        assert!(valid_email("alice@example.com"));
        assert!(!valid_email(""));
        assert!(!valid_email("alice"));
        assert!(!valid_email("alice@example"));
        assert!(!valid_email("al ice@example.com"));
    }

    #[test]
    fn blank_is_absent() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(Some(" laptop ")), Some("laptop"));
    }
}
