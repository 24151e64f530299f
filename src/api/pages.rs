//! Landing pages and the TV panel.
//!
//! Business content for these pages lives elsewhere; here they only prove
//! who is looking and hand over pending notices.

use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use super::context::RequestContext;
use super::guard::authorize;
use super::observability::{AuthVia, record_identity};
use super::{ApiError, ApiResponse, AppState, PageDto, PanelAccess, TvPanelDto, TvPanelQuery};
use crate::domain::{Access, AccessAction};
use crate::domain::notices;

async fn page(
    state: &AppState,
    ctx: &RequestContext,
    access: Access,
    name: &'static str,
) -> Result<Json<ApiResponse<PageDto>>, ApiError> {
    let user = authorize(state, ctx, access).await?;

    Ok(Json(ApiResponse::success(PageDto {
        page: name,
        user: user.into(),
        notices: ctx.take_notices().await,
    })))
}

/// GET /
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<PageDto>>, ApiError> {
    page(&state, &ctx, Access::Authenticated, "dashboard").await
}

/// GET /physician/dashboard
pub async fn physician_dashboard(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<PageDto>>, ApiError> {
    page(&state, &ctx, Access::Clinical, "physician_dashboard").await
}

/// GET /scheduling/appointments
pub async fn scheduling(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<PageDto>>, ApiError> {
    page(&state, &ctx, Access::Staff, "scheduling").await
}

/// GET /panel/tv
/// Admits any signed-in user or a valid `?token=`. Unattended displays can't
/// follow a login redirect, so everyone else gets a plain 403.
pub async fn tv_panel(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Query(query): Query<TvPanelQuery>,
) -> Result<Json<ApiResponse<TvPanelDto>>, ApiError> {
    if let Some(user) = ctx.current_user(&state).await {
        record_identity(user.id, user.role, AuthVia::Session);
        return Ok(Json(ApiResponse::success(TvPanelDto {
            viewer: user.name,
            access: PanelAccess::Session,
        })));
    }

    if let Some(token) = query.token.as_deref()
        && let Some(user) = state.auth_service.validate_tv_token(token).await
    {
        record_identity(user.id, user.role, AuthVia::TvToken);
        return Ok(Json(ApiResponse::success(TvPanelDto {
            viewer: user.name,
            access: PanelAccess::Token,
        })));
    }

    warn!(
        client = ctx.client.address.as_deref().unwrap_or("unknown"),
        token_supplied = query.token.is_some(),
        "TV panel access denied"
    );
    metrics::counter!("auth_gate_rejections_total", "reason" => "tv_access_denied").increment(1);
    state
        .audit
        .record(
            None,
            AccessAction::AccessDenied,
            &ctx.client,
            Some(json!({ "page": "tv_panel", "token_supplied": query.token.is_some() })),
            false,
        )
        .await;

    Err(ApiError::Forbidden(notices::TV_ACCESS_DENIED.to_string()))
}
