//! Per-request context handed to every handler.
//!
//! Bundles the cookie session, the client's address and agent, and helpers
//! for the signed-in identity and one-shot notices. Nothing here is global:
//! each request extracts its own.

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower_sessions::Session;
use tracing::warn;

use super::{ApiError, AppState};
use crate::db::User;
use crate::domain::notices::Notice;
use crate::domain::{Role, UserId};
use crate::services::ClientInfo;

const IDENTITY_KEY: &str = "auth";
const NOTICES_KEY: &str = "notices";

/// What the cookie session remembers about the signed-in user. Role and name
/// are a display copy; the session token decides validity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub token: String,
    pub user_id: UserId,
    pub role: Role,
    pub name: String,
}

impl SessionIdentity {
    #[must_use]
    pub fn new(user: &User, token: String) -> Self {
        Self {
            token,
            user_id: user.id,
            role: user.role,
            name: user.name.clone(),
        }
    }
}

pub struct RequestContext {
    pub session: Session,
    pub client: ClientInfo,
    pub host: Option<String>,
}

impl FromRequestParts<Arc<AppState>> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| ApiError::internal(msg))?;

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let address = client_address(
            peer,
            &parts.headers,
            &state.config.server.trusted_proxy_ips,
        );

        let agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);

        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);

        Ok(Self {
            session,
            client: ClientInfo::new(address, agent),
            host,
        })
    }
}

impl RequestContext {
    pub async fn identity(&self) -> Option<SessionIdentity> {
        match self.session.get::<SessionIdentity>(IDENTITY_KEY).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Failed to read session identity");
                None
            }
        }
    }

    /// Resolves the signed-in user through the session manager. A stale
    /// identity is dropped from the cookie session.
    pub async fn current_user(&self, state: &AppState) -> Option<User> {
        let identity = self.identity().await?;
        let user = state.auth_service.resolve_session(&identity.token).await;

        if user.is_none()
            && let Err(e) = self.session.remove::<SessionIdentity>(IDENTITY_KEY).await
        {
            warn!(error = %e, "Failed to clear stale session identity");
        }

        user
    }

    /// Starts a signed-in session. The cookie id is cycled first so a
    /// pre-login id can't be reused.
    pub async fn sign_in(&self, identity: &SessionIdentity) -> Result<(), ApiError> {
        self.session
            .cycle_id()
            .await
            .map_err(|e| ApiError::internal(format!("Failed to cycle session id: {e}")))?;

        self.session
            .insert(IDENTITY_KEY, identity)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to store session identity: {e}")))
    }

    /// Drops everything the cookie session holds.
    pub async fn sign_out(&self) {
        if let Err(e) = self.session.flush().await {
            warn!(error = %e, "Failed to flush session");
        }
    }

    pub async fn push_notice(&self, notice: Notice) {
        let mut pending = self.peek_notices().await;
        pending.push(notice);

        if let Err(e) = self.session.insert(NOTICES_KEY, pending).await {
            warn!(error = %e, "Failed to store notice");
        }
    }

    /// Returns and clears pending notices.
    pub async fn take_notices(&self) -> Vec<Notice> {
        match self.session.remove::<Vec<Notice>>(NOTICES_KEY).await {
            Ok(notices) => notices.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Failed to read notices");
                Vec::new()
            }
        }
    }

    async fn peek_notices(&self) -> Vec<Notice> {
        self.session
            .get::<Vec<Notice>>(NOTICES_KEY)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}

/// Socket peer address, or the first `X-Forwarded-For` hop when the peer is a
/// trusted proxy.
fn client_address(
    peer: Option<IpAddr>,
    headers: &HeaderMap,
    trusted_proxies: &[String],
) -> Option<String> {
    let peer = peer?;

    let trusted = trusted_proxies
        .iter()
        .filter_map(|ip| ip.parse::<IpAddr>().ok())
        .any(|ip| ip == peer);

    if trusted
        && let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| v.parse::<IpAddr>().is_ok())
    {
        return Some(forwarded.to_string());
    }

    Some(peer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_client_address_without_peer() {
        assert_eq!(client_address(None, &HeaderMap::new(), &[]), None);
    }

    #[test]
    fn test_forwarded_header_ignored_from_untrusted_peer() {
        let peer: IpAddr = "203.0.113.9".parse().unwrap();
        let address = client_address(Some(peer), &forwarded("10.0.0.1"), &[]);
        assert_eq!(address.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_forwarded_header_used_from_trusted_proxy() {
        let peer: IpAddr = "127.0.0.1".parse().unwrap();
        let trusted = vec!["127.0.0.1".to_string()];

        let address = client_address(Some(peer), &forwarded("198.51.100.7, 127.0.0.1"), &trusted);
        assert_eq!(address.as_deref(), Some("198.51.100.7"));

        let garbage = client_address(Some(peer), &forwarded("not-an-ip"), &trusted);
        assert_eq!(garbage.as_deref(), Some("127.0.0.1"));
    }
}
