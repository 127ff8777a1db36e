//! Field validators for registration and profile input.
//!
//! Validators accumulate every violated rule instead of stopping at the
//! first one, so callers can report the complete list back to the user.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

const MAX_EMAIL_LENGTH: usize = 255;
const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PASSWORD_LENGTH: usize = 128;

lazy_static! {
    // Permissive on purpose: one @, no whitespace, a dot somewhere in the
    // domain. Deliverability is not something a regex can prove.
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    // Shape check before the calendar check; the parser alone would accept
    // unpadded dates like 1990-1-5.
    static ref DATE_REGEX: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Required(&'static str),
    TooShort(&'static str, usize),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
    NotADate(&'static str),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Required(field) => write!(f, "{} is required", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} must be at least {} characters long", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} must be at most {} characters long", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::NotADate(field) => {
                write!(f, "{} must be a real date in format YYYY-MM-DD", field)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Lower-cases and trims an email address. Every lookup and every stored
/// email goes through this, so `Foo@Bar.com ` and `foo@bar.com` are the
/// same account.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates an email address and returns its normalized form.
pub fn validate_email(email: Option<&str>) -> Result<String, Vec<ValidationError>> {
    let trimmed = match email.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Err(vec![ValidationError::Required("email")]),
    };

    let mut errors = Vec::new();
    if !EMAIL_REGEX.is_match(trimmed) {
        errors.push(ValidationError::InvalidFormat("email"));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        errors.push(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if errors.is_empty() {
        Ok(normalize_email(trimmed))
    } else {
        Err(errors)
    }
}

/// Validates a password and returns it unchanged. Passwords are never
/// trimmed or otherwise normalized.
pub fn validate_password(password: Option<&str>) -> Result<String, Vec<ValidationError>> {
    let password = match password {
        Some(value) if !value.is_empty() => value,
        _ => return Err(vec![ValidationError::Required("password")]),
    };

    let mut errors = Vec::new();
    if password.len() < MIN_PASSWORD_LENGTH {
        errors.push(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        errors.push(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }

    if errors.is_empty() {
        Ok(password.to_string())
    } else {
        Err(errors)
    }
}

/// Validates a `YYYY-MM-DD` date of birth and parses it into a real
/// calendar date.
pub fn validate_dob(dob: &str) -> Result<NaiveDate, ValidationError> {
    if !DATE_REGEX.is_match(dob) {
        return Err(ValidationError::NotADate("dob"));
    }
    NaiveDate::parse_from_str(dob, "%Y-%m-%d").map_err(|_| ValidationError::NotADate("dob"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert_eq!(
            validate_email(Some("user@example.com")),
            Ok("user@example.com".to_string())
        );
        assert!(validate_email(Some("test.email@domain.co.uk")).is_ok());
        assert!(validate_email(Some("user+tag@example.com")).is_ok());
    }

    #[test]
    fn test_email_is_normalized() {
        assert_eq!(
            validate_email(Some("  User@Example.COM  ")),
            Ok("user@example.com".to_string())
        );
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(validate_email(Some("invalid")).is_err());
        assert!(validate_email(Some("user@")).is_err());
        assert!(validate_email(Some("@example.com")).is_err());
        assert!(validate_email(Some("user@domain")).is_err());
        assert!(validate_email(Some("two words@example.com")).is_err());
    }

    #[test]
    fn test_missing_email() {
        assert_eq!(
            validate_email(None),
            Err(vec![ValidationError::Required("email")])
        );
        assert_eq!(
            validate_email(Some("   ")),
            Err(vec![ValidationError::Required("email")])
        );
    }

    #[test]
    fn test_email_length_limit() {
        let longest = format!("{}@example.com", "a".repeat(243));
        assert_eq!(longest.len(), 255);
        assert!(validate_email(Some(&longest)).is_ok());

        let too_long = format!("{}@example.com", "a".repeat(244));
        assert_eq!(
            validate_email(Some(&too_long)),
            Err(vec![ValidationError::TooLong("email", 255)])
        );
    }

    #[test]
    fn test_email_accumulates_errors() {
        let long_and_malformed = "a".repeat(256);
        let errors = validate_email(Some(&long_and_malformed)).unwrap_err();
        assert!(errors.contains(&ValidationError::InvalidFormat("email")));
        assert!(errors.contains(&ValidationError::TooLong("email", 255)));
    }

    #[test]
    fn test_password_length_limits() {
        assert!(validate_password(Some("12345")).is_err());
        assert!(validate_password(Some("123456")).is_ok());
        assert!(validate_password(Some(&"a".repeat(128))).is_ok());
        assert_eq!(
            validate_password(Some(&"a".repeat(129))),
            Err(vec![ValidationError::TooLong("password", 128)])
        );
    }

    #[test]
    fn test_missing_password() {
        assert_eq!(
            validate_password(None),
            Err(vec![ValidationError::Required("password")])
        );
        assert_eq!(
            validate_password(Some("")),
            Err(vec![ValidationError::Required("password")])
        );
    }

    #[test]
    fn test_password_is_not_trimmed() {
        assert_eq!(
            validate_password(Some("  pass  ")),
            Ok("  pass  ".to_string())
        );
    }

    #[test]
    fn test_valid_dob() {
        assert_eq!(
            validate_dob("1990-06-15"),
            Ok(NaiveDate::from_ymd_opt(1990, 6, 15).expect("valid date"))
        );
        // leap day
        assert!(validate_dob("2020-02-29").is_ok());
    }

    #[test]
    fn test_invalid_dob() {
        assert!(validate_dob("15-06-1990").is_err());
        assert!(validate_dob("1990/06/15").is_err());
        assert!(validate_dob("1990-6-15").is_err());
        assert!(validate_dob("not-a-date").is_err());
        // well-shaped but not a real calendar date
        assert!(validate_dob("2021-02-30").is_err());
        assert!(validate_dob("2021-13-01").is_err());
    }
}
