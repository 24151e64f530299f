use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Serialize;

use crate::domain::{AccessAction, UserId};
use crate::entities::{access_logs, prelude::*};

#[derive(Debug, Clone)]
pub struct NewAccessLog {
    pub user_id: Option<UserId>,
    pub action: AccessAction,
    pub client_address: Option<String>,
    pub client_agent: Option<String>,
    pub detail: Option<serde_json::Value>,
    pub success: bool,
}

/// Audit row joined with the acting user's name and email, when known.
#[derive(Debug, Clone, Serialize)]
pub struct AccessLogEntry {
    pub id: i64,
    pub user_id: Option<i32>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub action: AccessAction,
    pub client_address: Option<String>,
    pub client_agent: Option<String>,
    pub detail: Option<serde_json::Value>,
    pub success: bool,
    pub created_at: DateTime<Utc>,
}

impl AccessLogEntry {
    fn from_parts(log: access_logs::Model, user: Option<crate::entities::users::Model>) -> Self {
        Self {
            id: log.id,
            user_id: log.user_id,
            user_name: user.as_ref().map(|u| u.name.clone()),
            user_email: user.map(|u| u.email),
            action: log.action,
            client_address: log.client_address,
            client_agent: log.client_agent,
            detail: log.detail,
            success: log.success,
            created_at: log.created_at,
        }
    }
}

pub struct AccessLogRepository {
    conn: DatabaseConnection,
}

impl AccessLogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(&self, entry: NewAccessLog) -> Result<()> {
        let active_model = access_logs::ActiveModel {
            user_id: Set(entry.user_id.map(|id| id.value())),
            action: Set(entry.action),
            client_address: Set(entry.client_address),
            client_agent: Set(entry.client_agent),
            detail: Set(entry.detail),
            success: Set(entry.success),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        AccessLogs::insert(active_model)
            .exec(&self.conn)
            .await
            .context("Failed to insert access log")?;
        Ok(())
    }

    /// Newest first, across all users.
    pub async fn recent(&self, limit: u64) -> Result<Vec<AccessLogEntry>> {
        let rows = AccessLogs::find()
            .find_also_related(Users)
            .order_by_desc(access_logs::Column::CreatedAt)
            .order_by_desc(access_logs::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query access logs")?;

        Ok(rows
            .into_iter()
            .map(|(log, user)| AccessLogEntry::from_parts(log, user))
            .collect())
    }

    pub async fn recent_for_user(&self, user_id: UserId, limit: u64) -> Result<Vec<AccessLogEntry>> {
        let rows = AccessLogs::find()
            .find_also_related(Users)
            .filter(access_logs::Column::UserId.eq(user_id.value()))
            .order_by_desc(access_logs::Column::CreatedAt)
            .order_by_desc(access_logs::Column::Id)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query access logs for user")?;

        Ok(rows
            .into_iter()
            .map(|(log, user)| AccessLogEntry::from_parts(log, user))
            .collect())
    }

    pub async fn count_by_action(&self, action: AccessAction) -> Result<u64> {
        AccessLogs::find()
            .filter(access_logs::Column::Action.eq(action))
            .count(&self.conn)
            .await
            .context("Failed to count access logs")
    }
}
