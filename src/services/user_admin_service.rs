//! Domain service for administrator account management.
//!
//! Creates, edits, and deactivates staff accounts, manages the TV panel token,
//! and exposes the access log.

use sea_orm::{DbErr, SqlErr};
use std::fmt;
use thiserror::Error;

use crate::db::{AccessLogEntry, User};
use crate::domain::{Role, UserId};
use crate::services::access_log::ClientInfo;

/// Which unique attribute a rejected write collided on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Email,
    TvToken,
}

impl IdentityField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::TvToken => "tv_token",
        }
    }
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors specific to account management.
#[derive(Debug, Error)]
pub enum UserAdminError {
    #[error("Duplicate {field}")]
    DuplicateIdentity { field: IdentityField },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("User not found")]
    UserNotFound,

    #[error("No active TV panel account")]
    NoTvAccount,

    #[error("Store failure: {0}")]
    TransientStoreFailure(String),
}

impl From<anyhow::Error> for UserAdminError {
    fn from(err: anyhow::Error) -> Self {
        duplicate_field(&err).map_or_else(
            || Self::TransientStoreFailure(format!("{err:#}")),
            |field| Self::DuplicateIdentity { field },
        )
    }
}

/// Maps a unique-constraint violation anywhere in the error chain to the
/// column it hit.
#[must_use]
pub fn duplicate_field(err: &anyhow::Error) -> Option<IdentityField> {
    let db_err = err.chain().find_map(|cause| cause.downcast_ref::<DbErr>())?;

    match db_err.sql_err()? {
        SqlErr::UniqueConstraintViolation(message) => {
            if message.contains("tv_token") {
                Some(IdentityField::TvToken)
            } else {
                Some(IdentityField::Email)
            }
        }
        _ => None,
    }
}

/// Input for a new account. The password is plaintext and hashed by the service.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub staff_profile_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct AccountUpdate {
    pub name: String,
    pub email: String,
    pub active: bool,
    /// Replaces the password when present and non-empty.
    pub new_password: Option<String>,
}

/// Domain service trait for account management.
#[async_trait::async_trait]
pub trait UserAdminService: Send + Sync {
    /// Creates an account. TV panel accounts receive a generated token.
    ///
    /// # Errors
    ///
    /// Returns [`UserAdminError::DuplicateIdentity`] when the email is taken;
    /// no row is written in that case.
    async fn create_user(&self, account: NewAccount) -> Result<User, UserAdminError>;

    async fn update_user(
        &self,
        id: UserId,
        update: AccountUpdate,
    ) -> Result<User, UserAdminError>;

    /// Soft delete: clears the active flag.
    async fn deactivate_user(&self, id: UserId) -> Result<(), UserAdminError>;

    /// All accounts, newest first.
    async fn list_users(&self) -> Result<Vec<User>, UserAdminError>;

    async fn get_user(&self, id: UserId) -> Result<User, UserAdminError>;

    /// The active TV panel account, whose token drives the kiosk display.
    async fn tv_panel_account(&self) -> Result<User, UserAdminError>;

    /// Replaces the TV panel token. The previous token stops working at once.
    /// `actor` is `None` when run from the command line.
    async fn regenerate_tv_token(
        &self,
        actor: Option<UserId>,
        client: &ClientInfo,
    ) -> Result<User, UserAdminError>;

    /// Most recent audit entries across all users, newest first.
    async fn access_logs(&self, limit: u64) -> Result<Vec<AccessLogEntry>, UserAdminError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_errors_are_transient() {
        let err: UserAdminError = anyhow::anyhow!("connection reset").into();
        assert!(matches!(err, UserAdminError::TransientStoreFailure(_)));
    }

    #[test]
    fn test_identity_field_names() {
        assert_eq!(IdentityField::Email.to_string(), "email");
        assert_eq!(IdentityField::TvToken.to_string(), "tv_token");
    }
}
