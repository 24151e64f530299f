use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::domain::{AccessAction, UserId};

pub mod migrator;
pub mod repositories;

pub use repositories::access_log::{AccessLogEntry, NewAccessLog};
pub use repositories::session::{NewSession, SessionRecord};
pub use repositories::user::{NewUser, User, UserUpdate};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    /// Raw pool shared with the HTTP session-cookie store.
    #[must_use]
    pub fn sqlite_pool(&self) -> tower_sessions_sqlx_store::sqlx::SqlitePool {
        self.conn.get_sqlite_connection_pool().clone()
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    fn access_log_repo(&self) -> repositories::access_log::AccessLogRepository {
        repositories::access_log::AccessLogRepository::new(self.conn.clone())
    }

    // ========== User Repository Methods ==========

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo().get_by_email_with_password(email).await
    }

    pub async fn get_user_password_hash(&self, id: UserId) -> Result<Option<String>> {
        self.user_repo().get_password_hash(id).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list().await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    pub async fn create_user(&self, user: NewUser) -> Result<User> {
        self.user_repo().create(user).await
    }

    pub async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<Option<User>> {
        self.user_repo().update(id, update).await
    }

    pub async fn set_user_active(&self, id: UserId, active: bool) -> Result<bool> {
        self.user_repo().set_active(id, active).await
    }

    pub async fn update_user_password_hash(&self, id: UserId, password_hash: String) -> Result<()> {
        self.user_repo()
            .update_password_hash(id, password_hash)
            .await
    }

    pub async fn touch_user_last_access(&self, id: UserId) -> Result<()> {
        self.user_repo().touch_last_access(id).await
    }

    pub async fn find_active_tv_user(&self, token: &str) -> Result<Option<User>> {
        self.user_repo().find_active_tv_user(token).await
    }

    pub async fn first_active_tv_user(&self) -> Result<Option<User>> {
        self.user_repo().first_active_tv_user().await
    }

    pub async fn set_user_tv_token(&self, id: UserId, token: &str) -> Result<()> {
        self.user_repo().set_tv_token(id, token).await
    }

    // ========== Session Repository Methods ==========

    pub async fn insert_session(&self, session: NewSession) -> Result<SessionRecord> {
        self.session_repo().insert(session).await
    }

    pub async fn get_session_by_token(&self, token: &str) -> Result<Option<SessionRecord>> {
        self.session_repo().find_by_token(token).await
    }

    pub async fn delete_session(&self, token: &str) -> Result<u64> {
        self.session_repo().delete_by_token(token).await
    }

    pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        self.session_repo().delete_expired(now).await
    }

    pub async fn count_sessions_for_user(&self, user_id: UserId) -> Result<u64> {
        self.session_repo().count_for_user(user_id).await
    }

    pub async fn count_sessions(&self) -> Result<u64> {
        self.session_repo().count().await
    }

    // ========== Access Log Repository Methods ==========

    pub async fn add_access_log(&self, entry: NewAccessLog) -> Result<()> {
        self.access_log_repo().add(entry).await
    }

    pub async fn recent_access_logs(&self, limit: u64) -> Result<Vec<AccessLogEntry>> {
        self.access_log_repo().recent(limit).await
    }

    pub async fn recent_access_logs_for_user(
        &self,
        user_id: UserId,
        limit: u64,
    ) -> Result<Vec<AccessLogEntry>> {
        self.access_log_repo()
            .recent_for_user(user_id, limit)
            .await
    }

    pub async fn count_access_logs(&self, action: AccessAction) -> Result<u64> {
        self.access_log_repo().count_by_action(action).await
    }
}
