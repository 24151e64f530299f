//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::SecurityConfig;
use crate::db::{Store, User};
use crate::domain::notices;
use crate::domain::{AccessAction, UserId, normalize_email};
use crate::services::access_log::{AccessLogger, ClientInfo};
use crate::services::auth_service::{
    AuthError, AuthService, LoginOutcome, PasswordChange, ProfileView,
};
use crate::services::password::PasswordService;
use crate::services::session_manager::SessionManager;

const PROFILE_ACTIVITY_LIMIT: u64 = 10;

pub struct SeaOrmAuthService {
    store: Store,
    passwords: PasswordService,
    sessions: SessionManager,
    audit: AccessLogger,
    auto_migrate_hashes: bool,
    min_password_length: usize,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        passwords: PasswordService,
        sessions: SessionManager,
        audit: AccessLogger,
        security: &SecurityConfig,
    ) -> Self {
        Self {
            store,
            passwords,
            sessions,
            audit,
            auto_migrate_hashes: security.auto_migrate_password_hashes,
            min_password_length: security.min_password_length,
        }
    }

    /// Records a failed attempt with its real reason and returns the one
    /// error every failure cause shares.
    async fn reject_login(
        &self,
        user_id: Option<UserId>,
        email: &str,
        reason: &'static str,
        client: &ClientInfo,
    ) -> AuthError {
        warn!(email = %email, reason, "Login failed");
        metrics::counter!("auth_logins_total", "outcome" => "failure").increment(1);

        self.audit
            .record(
                user_id,
                AccessAction::Login,
                client,
                Some(json!({ "email": email, "reason": reason })),
                false,
            )
            .await;

        AuthError::InvalidCredentials
    }

    /// Re-hashes with the configured Argon2 params. Never fails the login.
    async fn migrate_hash(&self, user: &User, password: &str, digest: &str) {
        if !self.auto_migrate_hashes || !self.passwords.needs_rehash(digest) {
            return;
        }

        let result = match self.passwords.hash(password).await {
            Ok(new_hash) => self.store.update_user_password_hash(user.id, new_hash).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => info!(user_id = user.id.value(), "Password hash migrated"),
            Err(e) => warn!(user_id = user.id.value(), error = ?e, "Password hash migration failed"),
        }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientInfo,
    ) -> Result<LoginOutcome, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(notices::MISSING_FIELDS.to_string()));
        }

        let Some((user, digest)) = self.store.get_user_by_email_with_password(&email).await?
        else {
            return Err(self
                .reject_login(None, &email, "user_not_found", client)
                .await);
        };

        if !user.active {
            return Err(self
                .reject_login(Some(user.id), &email, "user_inactive", client)
                .await);
        }

        if !self.passwords.verify(password, &digest).await {
            return Err(self
                .reject_login(Some(user.id), &email, "wrong_password", client)
                .await);
        }

        if let Err(e) = self.sessions.sweep_expired().await {
            warn!(error = ?e, "Expired session sweep failed");
        }

        let token = self
            .sessions
            .create_session(user.id, client)
            .await
            .map_err(|e| {
                error!(user_id = user.id.value(), error = ?e, "Failed to create session");
                AuthError::SessionUnavailable
            })?;

        if let Err(e) = self.store.touch_user_last_access(user.id).await {
            warn!(user_id = user.id.value(), error = ?e, "Failed to update last access");
        }

        self.audit
            .record(Some(user.id), AccessAction::Login, client, None, true)
            .await;

        self.migrate_hash(&user, password, &digest).await;

        metrics::counter!("auth_logins_total", "outcome" => "success").increment(1);
        info!(user_id = user.id.value(), role = %user.role, "User logged in");

        Ok(LoginOutcome { user, token })
    }

    async fn logout(&self, token: &str, client: &ClientInfo) -> Option<User> {
        // Only a session that still resolves counts as a logout.
        let user = self.sessions.validate(token).await;

        if let Err(e) = self.sessions.invalidate(token).await {
            error!(error = ?e, "Failed to invalidate session");
        }

        let user = user?;
        self.audit
            .record(Some(user.id), AccessAction::Logout, client, None, true)
            .await;
        info!(user_id = user.id.value(), "User logged out");

        Some(user)
    }

    async fn resolve_session(&self, token: &str) -> Option<User> {
        self.sessions.validate(token).await
    }

    async fn validate_tv_token(&self, token: &str) -> Option<User> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        match self.store.find_active_tv_user(token).await {
            Ok(user) => user,
            Err(e) => {
                error!(error = ?e, "TV token lookup failed");
                None
            }
        }
    }

    async fn change_password(
        &self,
        user_id: UserId,
        change: PasswordChange,
        client: &ClientInfo,
    ) -> Result<(), AuthError> {
        if change.current_password.is_empty()
            || change.new_password.is_empty()
            || change.confirmation.is_empty()
        {
            return Err(AuthError::Validation(notices::MISSING_FIELDS.to_string()));
        }

        if change.new_password != change.confirmation {
            return Err(AuthError::Validation(
                notices::PASSWORD_MISMATCH.to_string(),
            ));
        }

        if change.new_password.chars().count() < self.min_password_length {
            return Err(AuthError::Validation(notices::password_too_short(
                self.min_password_length,
            )));
        }

        let digest = self
            .store
            .get_user_password_hash(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self
            .passwords
            .verify(&change.current_password, &digest)
            .await
        {
            return Err(AuthError::Validation(
                notices::CURRENT_PASSWORD_WRONG.to_string(),
            ));
        }

        let new_hash = self.passwords.hash(&change.new_password).await?;
        self.store
            .update_user_password_hash(user_id, new_hash)
            .await?;

        self.audit
            .record(
                Some(user_id),
                AccessAction::PasswordChanged,
                client,
                None,
                true,
            )
            .await;

        info!(user_id = user_id.value(), "Password changed");
        Ok(())
    }

    async fn profile(&self, user_id: UserId) -> Result<ProfileView, AuthError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let recent_activity = self
            .store
            .recent_access_logs_for_user(user_id, PROFILE_ACTIVITY_LIMIT)
            .await?;

        Ok(ProfileView {
            user,
            recent_activity,
        })
    }
}
