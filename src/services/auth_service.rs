//! Domain service for authentication.
//!
//! Handles login, logout, session resolution, password changes, and the
//! session-less TV panel token check.

use thiserror::Error;

use crate::db::{AccessLogEntry, User};
use crate::domain::{Access, UserId};
use crate::services::access_log::ClientInfo;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Authorization denied")]
    AuthorizationDenied,

    /// Same variant whether the email or the password was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Session could not be created")]
    SessionUnavailable,

    #[error("Store failure: {0}")]
    TransientStoreFailure(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::TransientStoreFailure(format!("{err:#}"))
    }
}

/// Successful login: the resolved user and the new session token.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirmation: String,
}

/// Current user plus their most recent audit entries.
#[derive(Debug, Clone)]
pub struct ProfileView {
    pub user: User,
    pub recent_activity: Vec<AccessLogEntry>,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and opens a session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email, an
    /// inactive account, or a wrong password alike, and
    /// [`AuthError::SessionUnavailable`] when the session cannot be stored.
    async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientInfo,
    ) -> Result<LoginOutcome, AuthError>;

    /// Invalidates the session token. The logout is recorded only when the
    /// token still resolved to an active user, who is returned.
    async fn logout(&self, token: &str, client: &ClientInfo) -> Option<User>;

    /// Resolves a session token to an active user.
    async fn resolve_session(&self, token: &str) -> Option<User>;

    /// Resolves a TV panel token to the active TV account that holds it.
    async fn validate_tv_token(&self, token: &str) -> Option<User>;

    /// Changes a user's password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for missing fields, a confirmation
    /// mismatch, a too-short password, or a wrong current password.
    async fn change_password(
        &self,
        user_id: UserId,
        change: PasswordChange,
        client: &ClientInfo,
    ) -> Result<(), AuthError>;

    /// Gets the profile page data for a user.
    async fn profile(&self, user_id: UserId) -> Result<ProfileView, AuthError>;
}

/// Gate decision for an already-resolved caller.
///
/// # Errors
///
/// [`AuthError::AuthenticationRequired`] when nobody is signed in,
/// [`AuthError::AuthorizationDenied`] when the role does not satisfy `access`.
pub fn authorize(user: Option<User>, access: Access) -> Result<User, AuthError> {
    let user = user.ok_or(AuthError::AuthenticationRequired)?;
    if access.permits(user.role) {
        Ok(user)
    } else {
        Err(AuthError::AuthorizationDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use chrono::Utc;

    fn user_with_role(role: Role) -> User {
        User {
            id: UserId::new(1),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            role,
            active: true,
            staff_profile_id: None,
            tv_token: None,
            last_access_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_authorize_requires_user() {
        let result = authorize(None, Access::Authenticated);
        assert!(matches!(result, Err(AuthError::AuthenticationRequired)));
    }

    #[test]
    fn test_authorize_checks_role() {
        let result = authorize(Some(user_with_role(Role::FrontDesk)), Access::AdminOnly);
        assert!(matches!(result, Err(AuthError::AuthorizationDenied)));

        let user = authorize(Some(user_with_role(Role::Physician)), Access::Clinical).unwrap();
        assert_eq!(user.role, Role::Physician);
    }

    #[test]
    fn test_store_errors_become_transient() {
        let err: AuthError = anyhow::anyhow!("disk I/O error").into();
        assert!(matches!(err, AuthError::TransientStoreFailure(_)));
    }
}
