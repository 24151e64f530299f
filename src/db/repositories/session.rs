use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use crate::domain::UserId;
use crate::entities::{prelude::*, user_sessions};

pub use crate::entities::user_sessions::Model as SessionRecord;

#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: UserId,
    pub token: String,
    pub client_address: Option<String>,
    pub client_agent: Option<String>,
    pub expires_at: DateTime<Utc>,
}

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, session: NewSession) -> Result<SessionRecord> {
        let active = user_sessions::ActiveModel {
            user_id: Set(session.user_id.value()),
            token: Set(session.token),
            client_address: Set(session.client_address),
            client_agent: Set(session.client_agent),
            expires_at: Set(session.expires_at),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert session")
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<SessionRecord>> {
        UserSessions::find()
            .filter(user_sessions::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query session by token")
    }

    /// Returns the number of rows removed (0 when the token is unknown).
    pub async fn delete_by_token(&self, token: &str) -> Result<u64> {
        let result = UserSessions::delete_many()
            .filter(user_sessions::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to delete session")?;

        Ok(result.rows_affected)
    }

    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = UserSessions::delete_many()
            .filter(user_sessions::Column::ExpiresAt.lt(now))
            .exec(&self.conn)
            .await
            .context("Failed to delete expired sessions")?;

        Ok(result.rows_affected)
    }

    pub async fn count_for_user(&self, user_id: UserId) -> Result<u64> {
        UserSessions::find()
            .filter(user_sessions::Column::UserId.eq(user_id.value()))
            .count(&self.conn)
            .await
            .context("Failed to count sessions")
    }

    pub async fn count(&self) -> Result<u64> {
        UserSessions::find()
            .count(&self.conn)
            .await
            .context("Failed to count sessions")
    }
}
