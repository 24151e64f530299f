use super::ApiError;
use crate::domain::{Role, normalize_email};

pub fn validate_user_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid user ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Name cannot be empty"));
    }

    if trimmed.chars().count() > 100 {
        return Err(ApiError::validation("Name must be 100 characters or less"));
    }

    Ok(trimmed)
}

/// Returns the normalized (trimmed, lower-cased) address.
pub fn validate_email(email: &str) -> Result<String, ApiError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(ApiError::validation("Email cannot be empty"));
    }

    if email.len() > 120 {
        return Err(ApiError::validation("Email must be 120 characters or less"));
    }

    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && !domain.is_empty() && !domain.contains('@')
    });
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(ApiError::validation(format!("Invalid email: {email}")));
    }

    Ok(email)
}

pub fn validate_role(role: &str) -> Result<Role, ApiError> {
    role.parse::<Role>()
        .map_err(|e| ApiError::validation(e.to_string()))
}

/// Blank form input means no linked profile.
pub fn validate_staff_profile_id(raw: Option<&str>) -> Result<Option<i32>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    match raw.parse::<i32>() {
        Ok(id) if id > 0 => Ok(Some(id)),
        _ => Err(ApiError::validation(format!(
            "Invalid staff profile ID: {raw}"
        ))),
    }
}
