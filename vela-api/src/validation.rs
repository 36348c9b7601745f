//! Input checks for account and profile forms.

use crate::error::AppError;

pub type ValidationResult = Result<(), AppError>;

fn invalid(msg: &str) -> ValidationResult {
    Err(AppError::ValidationError(msg.to_string()))
}

/// 2-100 characters after trimming.
pub fn validate_name(name: &str) -> ValidationResult {
    let trimmed = name.trim();
    if trimmed.chars().count() < 2 || trimmed.chars().count() > 100 {
        return invalid("Name must be 2-100 characters");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> ValidationResult {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return invalid("Email is required");
    }
    if trimmed.len() > 254 {
        return invalid("Email is too long (max 254 characters)");
    }

    let Some((local, domain)) = trimmed.split_once('@') else {
        return invalid("Email must contain '@'");
    };
    if local.is_empty() || local.len() > 64 || domain.contains('@') {
        return invalid("Email format is invalid");
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return invalid("Email domain is invalid");
    }
    Ok(())
}

/// 7-15 digits; `+`, spaces, dashes and parentheses are allowed around them.
pub fn validate_phone(phone: &str) -> ValidationResult {
    let trimmed = phone.trim();
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || "+- ()".contains(c))
    {
        return invalid("Phone number contains invalid characters");
    }
    let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
    if !(7..=15).contains(&digits) {
        return invalid("Phone number must have 7-15 digits");
    }
    Ok(())
}

/// 8-128 characters with an uppercase letter, a lowercase letter and a digit.
pub fn validate_password(password: &str) -> ValidationResult {
    if password.len() < 8 {
        return invalid("Password must be at least 8 characters");
    }
    if password.len() > 128 {
        return invalid("Password must be at most 128 characters");
    }

    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_upper || !has_lower || !has_digit {
        return invalid("Password must contain uppercase, lowercase and a digit");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_rules() {
        assert!(validate_password("Charter2030").is_ok());
        assert!(validate_password("Sh0rt").is_err());
        assert!(validate_password("alllowercase1").is_err());
        assert!(validate_password("ALLUPPERCASE1").is_err());
        assert!(validate_password("NoDigitsHere").is_err());
        assert!(validate_password(&format!("Aa1{}", "x".repeat(126))).is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("jane@example.com").is_ok());
        assert!(validate_email("jane.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("jane@localhost").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_phone_and_name() {
        assert!(validate_phone("+1 (212) 555-0100").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("call me").is_err());
        assert!(validate_name("Jo").is_ok());
        assert!(validate_name(" J ").is_err());
    }
}
