//! Administrator endpoints: account management, the access log, and the
//! TV panel token.

use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::context::RequestContext;
use super::guard::authorize;
use super::validation::{
    validate_email, validate_name, validate_role, validate_staff_profile_id, validate_user_id,
};
use super::{
    ApiError, ApiResponse, AppState, CreateUserForm, MessageResponse, TvTokenDto, UpdateUserForm,
    UserDto,
};
use crate::db::{AccessLogEntry, User};
use crate::domain::{Access, UserId};
use crate::services::tokens::tv_panel_url;
use crate::services::{AccountUpdate, NewAccount};

const ACCESS_LOG_PAGE_SIZE: u64 = 100;

/// GET /admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    authorize(&state, &ctx, Access::AdminOnly).await?;

    let users = state.user_admin_service.list_users().await?;
    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

/// POST /admin/users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Form(form): Form<CreateUserForm>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&state, &ctx, Access::AdminOnly).await?;

    let name = validate_name(&form.name)?.to_string();
    let email = validate_email(&form.email)?;
    let role = validate_role(&form.role)?;
    let staff_profile_id = validate_staff_profile_id(form.staff_profile_id.as_deref())?;

    let user = state
        .user_admin_service
        .create_user(NewAccount {
            name,
            email,
            password: form.password,
            role,
            staff_profile_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// GET /admin/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    authorize(&state, &ctx, Access::AdminOnly).await?;
    let id = validate_user_id(id)?;

    let user = state
        .user_admin_service
        .get_user(UserId::new(id))
        .await?;
    Ok(Json(ApiResponse::success(user.into())))
}

/// POST /admin/users/{id}
/// Edit name, email and active flag; optionally reset the password
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    Form(form): Form<UpdateUserForm>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    authorize(&state, &ctx, Access::AdminOnly).await?;
    let id = validate_user_id(id)?;

    let active = form.is_active();
    let name = validate_name(&form.name)?.to_string();
    let email = validate_email(&form.email)?;

    let user = state
        .user_admin_service
        .update_user(
            UserId::new(id),
            AccountUpdate {
                name,
                email,
                active,
                new_password: form.new_password,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// POST /admin/users/{id}/deactivate
pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    authorize(&state, &ctx, Access::AdminOnly).await?;
    let id = validate_user_id(id)?;

    state
        .user_admin_service
        .deactivate_user(UserId::new(id))
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("User {id} deactivated"),
    })))
}

/// GET /admin/access-logs
/// Latest entries across all users, newest first
pub async fn access_logs(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<Vec<AccessLogEntry>>>, ApiError> {
    authorize(&state, &ctx, Access::AdminOnly).await?;

    let entries = state
        .user_admin_service
        .access_logs(ACCESS_LOG_PAGE_SIZE)
        .await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// GET /admin/tv-token
pub async fn tv_token(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<TvTokenDto>>, ApiError> {
    authorize(&state, &ctx, Access::AdminOnly).await?;

    let account = state.user_admin_service.tv_panel_account().await?;
    Ok(Json(ApiResponse::success(tv_token_dto(
        &state, &ctx, account,
    )?)))
}

/// POST /admin/tv-token/regenerate
/// The previous token stops working immediately
pub async fn regenerate_tv_token(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<TvTokenDto>>, ApiError> {
    let admin = authorize(&state, &ctx, Access::AdminOnly).await?;

    let account = state
        .user_admin_service
        .regenerate_tv_token(Some(admin.id), &ctx.client)
        .await?;
    Ok(Json(ApiResponse::success(tv_token_dto(
        &state, &ctx, account,
    )?)))
}

fn tv_token_dto(
    state: &AppState,
    ctx: &RequestContext,
    account: User,
) -> Result<TvTokenDto, ApiError> {
    let panel_url = account
        .tv_token
        .as_deref()
        .map(|token| tv_panel_url(&state.config.server.base_url(ctx.host.as_deref()), token))
        .transpose()?;

    Ok(TvTokenDto {
        user_id: account.id,
        name: account.name,
        token: account.tv_token,
        panel_url,
    })
}
