//! First-run account seeding.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{Store, User};
use crate::domain::Role;
use crate::services::tokens::{generate_session_token, tv_panel_url};
use crate::services::user_admin_service::{NewAccount, UserAdminService};

const DEFAULT_ADMIN_PASSWORD: &str = "change-me";

#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub admin: Option<User>,
    pub tv_panel: Option<User>,
}

impl BootstrapReport {
    /// Whether this run created the first accounts.
    #[must_use]
    pub const fn seeded(&self) -> bool {
        self.admin.is_some()
    }
}

/// Seeds the administrator (and optionally the TV panel account) when the
/// user table is empty. A non-empty table is left untouched.
pub async fn seed_initial_accounts(
    store: &Store,
    users: &dyn UserAdminService,
    config: &Config,
) -> Result<BootstrapReport> {
    let bootstrap = &config.bootstrap;
    if !bootstrap.enabled {
        return Ok(BootstrapReport::default());
    }

    if store.count_users().await? > 0 {
        return Ok(BootstrapReport::default());
    }

    let admin = users
        .create_user(NewAccount {
            name: bootstrap.admin_name.clone(),
            email: bootstrap.admin_email.clone(),
            password: bootstrap.admin_password.clone(),
            role: Role::Administrator,
            staff_profile_id: None,
        })
        .await
        .context("Failed to create bootstrap administrator")?;

    info!(email = %admin.email, "Bootstrap administrator created");
    if bootstrap.admin_password == DEFAULT_ADMIN_PASSWORD {
        warn!("Bootstrap administrator uses the default password; change it after first login");
    }

    let tv_panel = if bootstrap.create_tv_panel {
        // Nobody signs in to the panel account interactively.
        let tv = users
            .create_user(NewAccount {
                name: "TV Panel".to_string(),
                email: bootstrap.tv_panel_email.clone(),
                password: generate_session_token(),
                role: Role::TvPanel,
                staff_profile_id: None,
            })
            .await
            .context("Failed to create bootstrap TV panel account")?;

        if let Some(token) = &tv.tv_token {
            let url = tv_panel_url(&config.server.base_url(None), token)?;
            info!(panel_url = %url, "TV panel account created");
        }

        Some(tv)
    } else {
        None
    };

    Ok(BootstrapReport {
        admin: Some(admin),
        tv_panel,
    })
}
