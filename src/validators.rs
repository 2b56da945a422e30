/// Input validators for authentication requests
///
/// Run before the engine so malformed bodies never reach the stores:
/// 1. DoS protection: length limits
/// 2. Email format check (an address that cannot be registered reveals nothing)

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_TOKEN_LENGTH: usize = 4096;
const MAX_USER_ID_LENGTH: usize = 128;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validate and normalise an email address, returning the trimmed value
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }
    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    Ok(trimmed.to_string())
}

/// Passwords are checked for presence and size only; they are never trimmed
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_LENGTH));
    }
    Ok(())
}

pub fn is_valid_user_id(user_id: &str) -> Result<String, ValidationError> {
    let trimmed = user_id.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("user_id"));
    }
    if trimmed.len() > MAX_USER_ID_LENGTH {
        return Err(ValidationError::TooLong("user_id", MAX_USER_ID_LENGTH));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat("user_id"));
    }

    Ok(trimmed.to_string())
}

pub fn is_valid_refresh_token(token: &str) -> Result<(), ValidationError> {
    if token.is_empty() {
        return Err(ValidationError::EmptyField("refresh_token"));
    }
    if token.len() > MAX_TOKEN_LENGTH {
        return Err(ValidationError::TooLong("refresh_token", MAX_TOKEN_LENGTH));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert_eq!(is_valid_email("  a@x.com ").unwrap(), "a@x.com");
        assert!(is_valid_email("first.last+tag@example.co.uk").is_ok());
    }

    #[test]
    fn test_invalid_emails() {
        for email in ["", "notanemail", "user@", "@example.com", "user@@example.com"] {
            assert!(is_valid_email(email).is_err(), "Should reject: {}", email);
        }
    }

    #[test]
    fn test_email_too_long() {
        let email = format!("{}@example.com", "a".repeat(250));
        assert_eq!(
            is_valid_email(&email),
            Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH))
        );
    }

    #[test]
    fn test_password_rules() {
        assert!(is_valid_password(" secret ").is_ok());
        assert_eq!(is_valid_password(""), Err(ValidationError::EmptyField("password")));
        assert!(is_valid_password(&"a".repeat(MAX_PASSWORD_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_user_id_rules() {
        assert_eq!(is_valid_user_id(" u1 ").unwrap(), "u1");
        assert!(is_valid_user_id("   ").is_err());
        assert!(is_valid_user_id("u1\n").is_ok());
        assert!(is_valid_user_id("u\u{0}1").is_err());
    }

    #[test]
    fn test_refresh_token_rules() {
        assert!(is_valid_refresh_token("abc.def.ghi").is_ok());
        assert!(is_valid_refresh_token("").is_err());
        assert!(is_valid_refresh_token(&"a".repeat(MAX_TOKEN_LENGTH + 1)).is_err());
    }
}
