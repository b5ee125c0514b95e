//! Form validation for the login, register and post forms.
//!
//! Runs before any remote call; the server enforces its own rules.

use std::sync::OnceLock;

use regex::Regex;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 15;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

/// A field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if email.trim().is_empty() {
        errors.push(FieldError::new("email", "Email is required."));
    } else if !email_pattern().is_match(email) {
        errors.push(FieldError::new("email", "Email is not valid."));
    }
}

fn check_password(password: &str, errors: &mut Vec<FieldError>) {
    let len = password.chars().count();
    if password.trim().is_empty() {
        errors.push(FieldError::new("password", "Password is required."));
    } else if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        errors.push(FieldError::new(
            "password",
            "Password must be 8-15 characters long.",
        ));
    }
}

/// Validates the login form. An empty result means the form may be sent.
pub fn validate_login(email: &str, password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_email(email, &mut errors);
    check_password(password, &mut errors);
    errors
}

/// Validates the registration form.
pub fn validate_register(
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "Name is required."));
    }
    check_email(email, &mut errors);
    check_password(password, &mut errors);
    if confirm_password.trim().is_empty() {
        errors.push(FieldError::new("confirm_password", "Confirm your password."));
    } else if password != confirm_password {
        errors.push(FieldError::new(
            "confirm_password",
            "Passwords do not match.",
        ));
    }
    errors
}

/// Validates a post draft: both fields must be non-blank.
pub fn validate_post(title: &str, content: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if title.trim().is_empty() {
        errors.push(FieldError::new("title", "Title is required."));
    }
    if content.trim().is_empty() {
        errors.push(FieldError::new("content", "Content is required."));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(errors: &[FieldError]) -> Vec<&'static str> {
        errors.iter().map(|e| e.field).collect()
    }

    #[test]
    fn test_login_accepts_valid_input() {
        assert!(validate_login("a@b.com", "wrongpass").is_empty());
    }

    #[test]
    fn test_login_rejects_bad_email_and_short_password() {
        let errors = validate_login("a@b", "short");
        assert_eq!(fields(&errors), vec!["email", "password"]);
        assert_eq!(errors[0].message, "Email is not valid.");
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(validate_login("a@b.com", "12345678").is_empty());
        assert!(validate_login("a@b.com", "123456789012345").is_empty());
        assert_eq!(validate_login("a@b.com", "1234567890123456").len(), 1);
    }

    #[test]
    fn test_register_requires_matching_confirmation() {
        let errors = validate_register("", "a@b.com", "password1", "password2");
        assert_eq!(fields(&errors), vec!["name", "confirm_password"]);
        assert_eq!(errors[1].message, "Passwords do not match.");
    }

    #[test]
    fn test_post_requires_both_fields() {
        assert_eq!(fields(&validate_post(" ", "")), vec!["title", "content"]);
        assert!(validate_post("T", "C").is_empty());
    }
}
