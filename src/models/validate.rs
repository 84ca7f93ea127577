//! Field validators shared by request types.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, AppResult};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+\-\s()]+$").expect("phone pattern is valid"));

pub fn email(value: &str) -> AppResult<()> {
    if EMAIL_RE.is_match(value) {
        Ok(())
    } else {
        Err(AppError::InvalidInput("Invalid email format".to_string()))
    }
}

/// Character count between `min` and `max`, inclusive.
pub fn length(field: &str, value: &str, min: usize, max: usize) -> AppResult<()> {
    let len = value.chars().count();
    if len < min {
        return Err(AppError::InvalidInput(format!(
            "{} must be at least {} characters",
            field, min
        )));
    }
    if len > max {
        return Err(AppError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

pub fn phone(value: &str) -> AppResult<()> {
    if !PHONE_RE.is_match(value) {
        return Err(AppError::InvalidInput(
            "Invalid phone number format".to_string(),
        ));
    }
    length("Phone number", value, 10, 20)
}

pub fn password(value: &str) -> AppResult<()> {
    length("Password", value, 6, 50)
}

/// Apply `check` when the field is present.
pub fn optional<F>(value: Option<&str>, check: F) -> AppResult<()>
where
    F: FnOnce(&str) -> AppResult<()>,
{
    value.map_or(Ok(()), check)
}
