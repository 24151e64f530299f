mod init;
mod sessions;
mod tv_token;
mod users;

pub use init::cmd_init;
pub use sessions::cmd_sessions_sweep;
pub use tv_token::{cmd_tv_token_regenerate, cmd_tv_token_show};
pub use users::{cmd_users_create, cmd_users_deactivate, cmd_users_list, cmd_users_reset_password};

use crate::config::Config;
use crate::db::Store;
use crate::services::{AccessLogger, PasswordService, SeaOrmUserAdminService};

/// Account service over a fresh store, for one-shot commands.
async fn open_user_admin(config: &Config) -> anyhow::Result<(Store, SeaOrmUserAdminService)> {
    let store = Store::new(&config.general.database_path).await?;
    let service = SeaOrmUserAdminService::new(
        store.clone(),
        PasswordService::new(&config.security),
        AccessLogger::new(store.clone()),
        &config.security,
    );
    Ok((store, service))
}
