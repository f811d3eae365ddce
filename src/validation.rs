use serde::Deserialize;
use thiserror::Error;

use crate::models::Role;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("latitude {0} is out of range")]
    Latitude(f64),
    #[error("longitude {0} is out of range")]
    Longitude(f64),
    #[error("latitude and longitude must be set together")]
    PartialCoordinates,
    #[error("pick at least one category")]
    NoCategory,
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("category listed twice: {0}")]
    DuplicateCategory(String),
    #[error("password must be at least 8 characters")]
    PasswordTooShort,
    #[error("password needs an uppercase letter")]
    PasswordNoUppercase,
    #[error("password needs a lowercase letter")]
    PasswordNoLowercase,
    #[error("password needs a digit")]
    PasswordNoDigit,
    #[error("password needs a symbol")]
    PasswordNoSymbol,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("{0} must be an http(s) link")]
    InvalidUrl(&'static str),
}

pub fn check_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(ValidationError::PasswordNoUppercase);
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(ValidationError::PasswordNoLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordNoDigit);
    }
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err(ValidationError::PasswordNoSymbol);
    }
    Ok(())
}

pub fn is_valid_password(password: &str) -> bool {
    check_password(password).is_ok()
}

pub fn check_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    let (local, domain) = email.split_once('@').ok_or(ValidationError::InvalidEmail)?;
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok || email.contains(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(trimmed)
    }
}

/// Blank links are treated as absent.
pub fn check_link(field: &'static str, value: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    match reqwest::Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Some(raw.to_string())),
        _ => Err(ValidationError::InvalidUrl(field)),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub display_name: String,
    pub role: Role,
}

impl RegistrationForm {
    pub fn check(&self) -> Result<(), ValidationError> {
        require("display name", &self.display_name)?;
        check_email(&self.email)?;
        check_password(&self.password)?;
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }
}
