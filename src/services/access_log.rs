//! Append-only audit trail of authentication events.

use crate::db::{NewAccessLog, Store};
use crate::domain::{AccessAction, UserId};

/// Where a request came from, as recorded on sessions and audit rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub address: Option<String>,
    pub agent: Option<String>,
}

impl ClientInfo {
    #[must_use]
    pub const fn new(address: Option<String>, agent: Option<String>) -> Self {
        Self { address, agent }
    }
}

#[derive(Clone)]
pub struct AccessLogger {
    store: Store,
}

impl AccessLogger {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Appends one entry. A write failure is reported to operators and never
    /// propagated to the caller.
    pub async fn record(
        &self,
        user_id: Option<UserId>,
        action: AccessAction,
        client: &ClientInfo,
        detail: Option<serde_json::Value>,
        success: bool,
    ) {
        let entry = NewAccessLog {
            user_id,
            action,
            client_address: client.address.clone(),
            client_agent: client.agent.clone(),
            detail,
            success,
        };

        if let Err(e) = self.store.add_access_log(entry).await {
            tracing::error!(
                error = ?e,
                action = ?action,
                user_id = ?user_id.map(|id| id.value()),
                "Failed to write access log"
            );
        }
    }
}
