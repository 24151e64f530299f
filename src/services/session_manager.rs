//! Server-side login sessions.
//!
//! A session row is `ACTIVE` until its fixed expiry, then `EXPIRED` until the
//! next read or sweep removes it. Logout removes it directly. Validation never
//! moves the expiry.

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::{debug, error};

use crate::db::{NewSession, Store, User};
use crate::domain::UserId;
use crate::services::access_log::ClientInfo;
use crate::services::tokens::generate_session_token;

#[derive(Clone)]
pub struct SessionManager {
    store: Store,
    ttl: Duration,
}

impl SessionManager {
    #[must_use]
    pub const fn new(store: Store, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Persists a new session and returns its token.
    pub async fn create_session(&self, user_id: UserId, client: &ClientInfo) -> Result<String> {
        let token = generate_session_token();
        let expires_at = Utc::now() + self.ttl;

        self.store
            .insert_session(NewSession {
                user_id,
                token: token.clone(),
                client_address: client.address.clone(),
                client_agent: client.agent.clone(),
                expires_at,
            })
            .await?;

        debug!(user_id = user_id.value(), %expires_at, "Session created");
        Ok(token)
    }

    /// Resolves a token to its user. Unknown, expired, and inactive-owner
    /// sessions all resolve to `None`, as does any store failure.
    pub async fn validate(&self, token: &str) -> Option<User> {
        match self.resolve(token).await {
            Ok(user) => user,
            Err(e) => {
                error!(error = ?e, "Session validation failed");
                None
            }
        }
    }

    async fn resolve(&self, token: &str) -> Result<Option<User>> {
        let Some(session) = self.store.get_session_by_token(token).await? else {
            return Ok(None);
        };

        if session.expires_at < Utc::now() {
            self.store.delete_session(token).await?;
            debug!(user_id = session.user_id, "Expired session removed");
            return Ok(None);
        }

        let Some(user) = self.store.get_user(UserId::new(session.user_id)).await? else {
            return Ok(None);
        };

        if !user.active {
            return Ok(None);
        }

        self.store.touch_user_last_access(user.id).await?;
        Ok(Some(user))
    }

    /// Removes the session. Unknown tokens are not an error.
    pub async fn invalidate(&self, token: &str) -> Result<()> {
        let removed = self.store.delete_session(token).await?;
        debug!(removed, "Session invalidated");
        Ok(())
    }

    /// Deletes every session whose expiry has passed.
    pub async fn sweep_expired(&self) -> Result<u64> {
        let removed = self.store.delete_expired_sessions(Utc::now()).await?;
        if removed > 0 {
            debug!(removed, "Expired sessions swept");
        }
        Ok(removed)
    }
}
