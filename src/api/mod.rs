use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, SessionManagerLayer, cookie::SameSite};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::Config;
use crate::db::Store;
use crate::domain::routes;
use crate::services::{
    AccessLogger, AuthService, PasswordService, SeaOrmAuthService, SeaOrmUserAdminService,
    SessionManager, UserAdminService, seed_initial_accounts,
};

mod admin;
mod auth;
pub mod context;
mod error;
pub mod guard;
pub mod observability;
mod pages;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

pub struct AppState {
    pub config: Arc<Config>,

    pub store: Store,

    pub sessions: SessionManager,

    pub audit: AccessLogger,

    pub auth_service: Arc<dyn AuthService>,

    pub user_admin_service: Arc<dyn UserAdminService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

/// Wires services around an open store.
#[must_use]
pub fn create_app_state(
    store: Store,
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let passwords = PasswordService::new(&config.security);
    let sessions = SessionManager::new(store.clone(), config.session_ttl());
    let audit = AccessLogger::new(store.clone());

    let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
        store.clone(),
        passwords.clone(),
        sessions.clone(),
        audit.clone(),
        &config.security,
    ));

    let user_admin_service: Arc<dyn UserAdminService> = Arc::new(SeaOrmUserAdminService::new(
        store.clone(),
        passwords,
        audit.clone(),
        &config.security,
    ));

    Arc::new(AppState {
        config: Arc::new(config),
        store,
        sessions,
        audit,
        auth_service,
        user_admin_service,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

/// Opens the database, applies migrations, and seeds first-run accounts.
pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let state = create_app_state(store, config, prometheus_handle);

    let report = seed_initial_accounts(
        &state.store,
        state.user_admin_service.as_ref(),
        &state.config,
    )
    .await?;
    if !report.seeded() {
        tracing::debug!("User table already populated, skipping first-run seeding");
    }

    Ok(state)
}

/// Cookie-session record store, sharing the application database.
pub async fn session_store(store: &Store) -> anyhow::Result<SqliteStore> {
    let sessions = SqliteStore::new(store.sqlite_pool());
    sessions.migrate().await?;
    Ok(sessions)
}

pub async fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let sessions = session_store(&state.store).await?;
    Ok(router_with_session_store(state, sessions))
}

fn router_with_session_store(state: Arc<AppState>, session_store: SqliteStore) -> Router {
    let server = &state.config.server;

    let ttl_hours = i64::from(state.config.security.session_ttl_hours);
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(server.secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(ttl_hours)));

    let cors_layer = if server.cors_allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = server
            .cors_allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    let app_routes = Router::new()
        .route(routes::DASHBOARD, get(pages::dashboard))
        .route(
            routes::LOGIN,
            get(auth::login_page).post(auth::login),
        )
        .route("/auth/logout", get(auth::logout).post(auth::logout))
        .route(routes::PROFILE, get(auth::profile))
        .route("/auth/change-password", post(auth::change_password))
        .route(routes::PHYSICIAN_DASHBOARD, get(pages::physician_dashboard))
        .route(routes::SCHEDULING, get(pages::scheduling))
        .route(routes::TV_PANEL, get(pages::tv_panel))
        .merge(admin_router())
        .route("/metrics", get(system::get_metrics))
        .layer(session_layer);

    Router::new()
        .merge(app_routes)
        .route("/health/live", get(system::health_live))
        .route("/health/ready", get(system::health_ready))
        .with_state(state)
        .layer(
            cors_layer
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(middleware::from_fn(observability::security_headers_middleware))
        // Inside the trace layer so handlers see the `request` span as current.
        .layer(middleware::from_fn(observability::request_span_middleware))
        .layer(TraceLayer::new_for_http())
}

fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            routes::ADMIN_USERS,
            get(admin::list_users).post(admin::create_user),
        )
        .route(
            "/admin/users/{id}",
            get(admin::get_user).post(admin::update_user),
        )
        .route("/admin/users/{id}/deactivate", post(admin::deactivate_user))
        .route("/admin/access-logs", get(admin::access_logs))
        .route(routes::ADMIN_TV_TOKEN, get(admin::tv_token))
        .route(
            "/admin/tv-token/regenerate",
            post(admin::regenerate_tv_token),
        )
}
