use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

pub const MAX_FIELD_LEN: usize = 255;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 40;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trimmed and lower-cased; emails are stored and looked up in this form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    if email.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::Validation(format!(
            "email must be at most {MAX_FIELD_LEN} characters"
        )));
    }
    if !is_valid_email(email) {
        return Err(AppError::Validation("value is not a valid email address".into()));
    }
    Ok(())
}

pub fn validate_password(field: &str, password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        return Err(AppError::Validation(format!(
            "{field} must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }
    if len > PASSWORD_MAX_LEN {
        return Err(AppError::Validation(format!(
            "{field} must be at most {PASSWORD_MAX_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_full_name(full_name: Option<&str>) -> Result<(), AppError> {
    max_len("full_name", full_name)
}

pub fn validate_title(title: &str) -> Result<(), AppError> {
    if title.is_empty() {
        return Err(AppError::Validation("title must not be empty".into()));
    }
    max_len("title", Some(title))
}

pub fn validate_description(description: Option<&str>) -> Result<(), AppError> {
    max_len("description", description)
}

fn max_len(field: &str, value: Option<&str>) -> Result<(), AppError> {
    match value {
        Some(v) if v.chars().count() > MAX_FIELD_LEN => Err(AppError::Validation(format!(
            "{field} must be at most {MAX_FIELD_LEN} characters"
        ))),
        _ => Ok(()),
    }
}
