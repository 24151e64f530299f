use tower_sessions::session_store::ExpiredDeletion;

use crate::api;
use crate::config::Config;
use crate::db::Store;
use crate::services::SessionManager;

/// Expired rows otherwise linger until the next login sweeps them.
pub async fn cmd_sessions_sweep(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let sessions = SessionManager::new(store.clone(), config.session_ttl());

    let removed = sessions.sweep_expired().await?;
    let remaining = store.count_sessions().await?;

    api::session_store(&store).await?.delete_expired().await?;

    println!("✓ Removed {removed} expired session(s); {remaining} still active.");
    Ok(())
}
