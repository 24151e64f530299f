//! Authorization gate for interactive pages.
//!
//! Every protected handler calls [`authorize`] first and returns early on
//! rejection, so the wrapped operation never runs for a caller who fails.

use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;
use tracing::warn;

use super::AppState;
use super::context::RequestContext;
use super::observability::{AuthVia, record_identity};
use crate::db::User;
use crate::domain::notices::{self, Notice};
use crate::domain::{Access, AccessAction, UserId, routes};
use crate::services::{self, AuthError};

/// Short-circuit outcome of the gate: a redirect, with the notice already
/// queued in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// No valid session: back to the login form.
    AuthenticationRequired,
    /// Signed in without the needed role: back to the dashboard.
    AuthorizationDenied,
}

impl GateRejection {
    const fn reason(self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "authentication_required",
            Self::AuthorizationDenied => "authorization_denied",
        }
    }

    const fn target(self) -> &'static str {
        match self {
            Self::AuthenticationRequired => routes::LOGIN,
            Self::AuthorizationDenied => routes::DASHBOARD,
        }
    }

    const fn message(self) -> &'static str {
        match self {
            Self::AuthenticationRequired => notices::LOGIN_REQUIRED,
            Self::AuthorizationDenied => notices::NOT_PERMITTED,
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        Redirect::to(self.target()).into_response()
    }
}

pub async fn authorize(
    state: &AppState,
    ctx: &RequestContext,
    access: Access,
) -> Result<User, GateRejection> {
    let user = ctx.current_user(state).await;

    let rejection = match services::authorize(user, access) {
        Ok(user) => {
            record_identity(user.id, user.role, AuthVia::Session);
            return Ok(user);
        }
        Err(AuthError::AuthorizationDenied) => GateRejection::AuthorizationDenied,
        Err(_) => GateRejection::AuthenticationRequired,
    };

    if rejection == GateRejection::AuthorizationDenied {
        let user_id = ctx.identity().await.map(|i| i.user_id);
        warn!(
            user_id = user_id.map(UserId::value),
            required = ?access,
            "Access denied"
        );
        state
            .audit
            .record(
                user_id,
                AccessAction::AccessDenied,
                &ctx.client,
                Some(json!({ "required": format!("{access:?}") })),
                false,
            )
            .await;
    }

    metrics::counter!("auth_gate_rejections_total", "reason" => rejection.reason()).increment(1);
    ctx.push_notice(Notice::error(rejection.message())).await;

    Err(rejection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{StatusCode, header};

    #[test]
    fn test_rejections_redirect() {
        let response = GateRejection::AuthenticationRequired.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], routes::LOGIN);

        let response = GateRejection::AuthorizationDenied.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], routes::DASHBOARD);
    }
}
