use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use super::context::{RequestContext, SessionIdentity};
use super::guard::authorize;
use super::{
    ApiError, ApiResponse, AppState, ChangePasswordForm, LoginForm, LoginPageDto, ProfileDto,
};
use crate::domain::notices::{self, Notice};
use crate::domain::{Access, routes};
use crate::services::PasswordChange;

/// GET /auth/login
/// Login form data, or a redirect to the landing page when already signed in
pub async fn login_page(State(state): State<Arc<AppState>>, ctx: RequestContext) -> Response {
    if let Some(user) = ctx.current_user(&state).await {
        return Redirect::to(user.role.landing_route()).into_response();
    }

    Json(ApiResponse::success(LoginPageDto {
        notices: ctx.take_notices().await,
    }))
    .into_response()
}

/// POST /auth/login
/// Verify email and password, open a session and redirect by role
pub async fn login(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let outcome = state
        .auth_service
        .login(&form.email, &form.password, &ctx.client)
        .await?;

    let identity = SessionIdentity::new(&outcome.user, outcome.token);
    ctx.sign_in(&identity).await?;
    ctx.push_notice(Notice::success(notices::welcome(&outcome.user.name)))
        .await;

    Ok(Redirect::to(outcome.user.role.landing_route()).into_response())
}

/// GET|POST /auth/logout
/// Invalidate the session token, clear the cookie session, back to login
pub async fn logout(State(state): State<Arc<AppState>>, ctx: RequestContext) -> Response {
    if let Some(identity) = ctx.identity().await {
        state
            .auth_service
            .logout(&identity.token, &ctx.client)
            .await;
    }

    ctx.sign_out().await;
    ctx.push_notice(Notice::info(notices::SIGNED_OUT)).await;

    Redirect::to(routes::LOGIN).into_response()
}

/// GET /auth/profile
/// Current user and their latest activity
pub async fn profile(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Json<ApiResponse<ProfileDto>>, ApiError> {
    let user = authorize(&state, &ctx, Access::Authenticated).await?;

    let view = state.auth_service.profile(user.id).await?;

    Ok(Json(ApiResponse::success(ProfileDto {
        user: view.user.into(),
        recent_activity: view.recent_activity,
        notices: ctx.take_notices().await,
    })))
}

/// POST /auth/change-password
/// Requires the current password; new password and confirmation must match
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Response, ApiError> {
    let user = authorize(&state, &ctx, Access::Authenticated).await?;

    state
        .auth_service
        .change_password(
            user.id,
            PasswordChange {
                current_password: form.current_password,
                new_password: form.new_password,
                confirmation: form.confirm_password,
            },
            &ctx.client,
        )
        .await?;

    ctx.push_notice(Notice::success(notices::PASSWORD_CHANGED))
        .await;

    Ok(Redirect::to(routes::PROFILE).into_response())
}
