pub mod access_log;
pub use access_log::{AccessLogger, ClientInfo};

pub mod password;
pub use password::PasswordService;

pub mod tokens;

pub mod session_manager;
pub use session_manager::SessionManager;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{
    AuthError, AuthService, LoginOutcome, PasswordChange, ProfileView, authorize,
};
pub use auth_service_impl::SeaOrmAuthService;

pub mod user_admin_service;
pub mod user_admin_service_impl;
pub use user_admin_service::{
    AccountUpdate, IdentityField, NewAccount, UserAdminError, UserAdminService,
};
pub use user_admin_service_impl::SeaOrmUserAdminService;

pub mod bootstrap;
pub use bootstrap::{BootstrapReport, seed_initial_accounts};
