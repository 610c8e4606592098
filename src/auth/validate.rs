//! Client-side form validation.
//!
//! Runs before any network call; a failure here is shown inline to the user
//! and never reaches the wire.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("that doesn't look like an email address")]
    BadEmail,
    #[error("password must be at least 8 characters")]
    ShortPassword,
    #[error("the one-time code is 6 digits")]
    BadOtpCode,
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("price must be greater than zero")]
    ZeroPrice,
}

/// Minimal shape check: non-empty local part, a domain with a dot, no spaces.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.contains(char::is_whitespace) {
        return Err(ValidationError::BadEmail);
    }
    let (local, domain) = email.split_once('@').ok_or(ValidationError::BadEmail)?;
    if local.is_empty() || domain.len() < 3 || !domain.contains('.') {
        return Err(ValidationError::BadEmail);
    }
    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::BadEmail);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < 8 {
        return Err(ValidationError::ShortPassword);
    }
    Ok(())
}

/// OTP codes are exactly 6 ASCII digits.
pub fn validate_otp_code(code: &str) -> Result<(), ValidationError> {
    let code = code.trim();
    if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::BadOtpCode);
    }
    Ok(())
}

pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Empty("name"));
    }
    Ok(())
}

/// Checks a new advert before posting.
pub fn validate_new_advert(title: &str, price_pence: u64) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::Empty("title"));
    }
    if price_pence == 0 {
        return Err(ValidationError::ZeroPrice);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("sam@example.co.uk").is_ok());
        assert!(validate_email("  padded@example.com  ").is_ok());
        assert_eq!(validate_email("no-at-sign"), Err(ValidationError::BadEmail));
        assert_eq!(validate_email("@example.com"), Err(ValidationError::BadEmail));
        assert_eq!(validate_email("sam@nodot"), Err(ValidationError::BadEmail));
        assert_eq!(validate_email("sam@.com"), Err(ValidationError::BadEmail));
        assert_eq!(
            validate_email("two words@example.com"),
            Err(ValidationError::BadEmail)
        );
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("longenough").is_ok());
        assert_eq!(
            validate_password("short"),
            Err(ValidationError::ShortPassword)
        );
    }

    #[test]
    fn test_otp_code() {
        assert!(validate_otp_code("123456").is_ok());
        assert!(validate_otp_code(" 123456 ").is_ok());
        assert_eq!(validate_otp_code("12345"), Err(ValidationError::BadOtpCode));
        assert_eq!(
            validate_otp_code("12345a"),
            Err(ValidationError::BadOtpCode)
        );
        assert_eq!(
            validate_otp_code("1234567"),
            Err(ValidationError::BadOtpCode)
        );
    }

    #[test]
    fn test_new_advert() {
        assert!(validate_new_advert("Cocker spaniel puppies", 85_000).is_ok());
        assert_eq!(
            validate_new_advert("   ", 100),
            Err(ValidationError::Empty("title"))
        );
        assert_eq!(
            validate_new_advert("Dog bed", 0),
            Err(ValidationError::ZeroPrice)
        );
    }
}
