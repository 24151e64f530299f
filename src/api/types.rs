use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{AccessLogEntry, User};
use crate::domain::notices::Notice;
use crate::domain::{Role, UserId};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Account as shown to clients. Never carries the password hash or TV token.
#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub staff_profile_id: Option<i32>,
    pub last_access_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            active: user.active,
            staff_profile_id: user.staff_profile_id,
            last_access_at: user.last_access_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Body of a rendered page: who is looking and any pending notices.
#[derive(Debug, Serialize)]
pub struct PageDto {
    pub page: &'static str,
    pub user: UserDto,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Serialize)]
pub struct LoginPageDto {
    pub notices: Vec<Notice>,
}

#[derive(Debug, Serialize)]
pub struct ProfileDto {
    pub user: UserDto,
    pub recent_activity: Vec<AccessLogEntry>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Serialize)]
pub struct TvTokenDto {
    pub user_id: UserId,
    pub name: String,
    pub token: Option<String>,
    pub panel_url: Option<String>,
}

/// How the TV panel caller was admitted.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PanelAccess {
    Session,
    Token,
}

#[derive(Debug, Serialize)]
pub struct TvPanelDto {
    pub viewer: String,
    pub access: PanelAccess,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Form payloads
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    /// Free text from the form; blank means no linked profile.
    pub staff_profile_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// HTML checkboxes are simply absent when unchecked.
    pub active: Option<String>,
    pub new_password: Option<String>,
}

impl UpdateUserForm {
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.active.as_deref(), Some("on" | "true" | "1"))
    }
}

#[derive(Debug, Deserialize)]
pub struct TvPanelQuery {
    pub token: Option<String>,
}
