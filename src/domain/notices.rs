//! One-shot user notices shown on the next rendered page.

use serde::{Deserialize, Serialize};

pub const LOGIN_REQUIRED: &str = "You need to log in to access this page.";
pub const NOT_PERMITTED: &str = "You do not have permission to access this page.";
pub const INVALID_CREDENTIALS: &str = "Incorrect email or password.";
pub const MISSING_FIELDS: &str = "Please fill in all fields.";
pub const SESSION_UNAVAILABLE: &str = "Could not start your session. Please try again.";
pub const SIGNED_OUT: &str = "You have been signed out.";
pub const PASSWORD_MISMATCH: &str = "The new password and its confirmation do not match.";
pub const CURRENT_PASSWORD_WRONG: &str = "Current password is incorrect.";
pub const PASSWORD_CHANGED: &str = "Password changed successfully!";
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";
pub const TV_ACCESS_DENIED: &str = "Access denied. Log in or provide a valid token.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

#[must_use]
pub fn password_too_short(min: usize) -> String {
    format!("The password must be at least {min} characters long.")
}

#[must_use]
pub fn welcome(name: &str) -> String {
    format!("Welcome, {name}!")
}
