//! `SeaORM` implementation of the `UserAdminService` trait.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::{AccessLogEntry, NewUser, Store, User, UserUpdate};
use crate::domain::{AccessAction, Role, UserId, normalize_email};
use crate::services::access_log::{AccessLogger, ClientInfo};
use crate::services::password::PasswordService;
use crate::services::tokens::generate_tv_token;
use crate::services::user_admin_service::{
    AccountUpdate, NewAccount, UserAdminError, UserAdminService,
};

pub struct SeaOrmUserAdminService {
    store: Store,
    passwords: PasswordService,
    audit: AccessLogger,
    min_password_length: usize,
}

impl SeaOrmUserAdminService {
    #[must_use]
    pub const fn new(
        store: Store,
        passwords: PasswordService,
        audit: AccessLogger,
        security: &SecurityConfig,
    ) -> Self {
        Self {
            store,
            passwords,
            audit,
            min_password_length: security.min_password_length,
        }
    }

    fn clean_identity(name: &str, email: &str) -> Result<(String, String), UserAdminError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(UserAdminError::Validation("Name is required".to_string()));
        }

        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            return Err(UserAdminError::Validation(
                "A valid email is required".to_string(),
            ));
        }

        Ok((name.to_string(), email))
    }

    fn check_password(&self, password: &str) -> Result<(), UserAdminError> {
        if password.chars().count() < self.min_password_length {
            return Err(UserAdminError::Validation(format!(
                "Password must be at least {} characters",
                self.min_password_length
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UserAdminService for SeaOrmUserAdminService {
    async fn create_user(&self, account: NewAccount) -> Result<User, UserAdminError> {
        let (name, email) = Self::clean_identity(&account.name, &account.email)?;
        self.check_password(&account.password)?;

        let staff_profile_id = if account.role == Role::Physician {
            account.staff_profile_id
        } else {
            None
        };
        let tv_token = account.role.uses_tv_token().then(generate_tv_token);

        let password_hash = self.passwords.hash(&account.password).await?;

        let user = self
            .store
            .create_user(NewUser {
                name,
                email,
                password_hash,
                role: account.role,
                staff_profile_id,
                tv_token,
            })
            .await?;

        info!(user_id = user.id.value(), role = %user.role, "User created");
        Ok(user)
    }

    async fn update_user(
        &self,
        id: UserId,
        update: AccountUpdate,
    ) -> Result<User, UserAdminError> {
        let (name, email) = Self::clean_identity(&update.name, &update.email)?;

        let password_hash = match update.new_password.filter(|p| !p.is_empty()) {
            Some(password) => {
                self.check_password(&password)?;
                Some(self.passwords.hash(&password).await?)
            }
            None => None,
        };
        let password_reset = password_hash.is_some();

        let user = self
            .store
            .update_user(
                id,
                UserUpdate {
                    name,
                    email,
                    active: update.active,
                    password_hash,
                },
            )
            .await?
            .ok_or(UserAdminError::UserNotFound)?;

        info!(
            user_id = id.value(),
            active = user.active,
            password_reset,
            "User updated"
        );
        Ok(user)
    }

    async fn deactivate_user(&self, id: UserId) -> Result<(), UserAdminError> {
        if !self.store.set_user_active(id, false).await? {
            return Err(UserAdminError::UserNotFound);
        }

        info!(user_id = id.value(), "User deactivated");
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>, UserAdminError> {
        Ok(self.store.list_users().await?)
    }

    async fn get_user(&self, id: UserId) -> Result<User, UserAdminError> {
        self.store
            .get_user(id)
            .await?
            .ok_or(UserAdminError::UserNotFound)
    }

    async fn tv_panel_account(&self) -> Result<User, UserAdminError> {
        self.store
            .first_active_tv_user()
            .await?
            .ok_or(UserAdminError::NoTvAccount)
    }

    async fn regenerate_tv_token(
        &self,
        actor: Option<UserId>,
        client: &ClientInfo,
    ) -> Result<User, UserAdminError> {
        let account = self.tv_panel_account().await?;
        let token = generate_tv_token();

        self.store.set_user_tv_token(account.id, &token).await?;

        self.audit
            .record(
                actor,
                AccessAction::TvTokenRegenerated,
                client,
                Some(json!({ "tv_user_id": account.id.value() })),
                true,
            )
            .await;

        info!(
            actor = actor.map(UserId::value),
            tv_user_id = account.id.value(),
            "TV panel token regenerated"
        );

        self.get_user(account.id).await
    }

    async fn access_logs(&self, limit: u64) -> Result<Vec<AccessLogEntry>, UserAdminError> {
        Ok(self.store.recent_access_logs(limit).await?)
    }
}
