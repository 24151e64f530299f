//! First-run setup

use crate::config::Config;
use crate::db::Store;
use crate::services::seed_initial_accounts;

use super::open_user_admin;

pub async fn cmd_init(config: &Config) -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("✓ Wrote default config.toml");
    } else {
        println!("config.toml already exists, leaving it alone");
    }

    let (store, service) = open_user_admin(config).await?;
    println!("✓ Database ready at {}", config.general.database_path);

    let report = seed_initial_accounts(&store, &service, config).await?;
    print_report(&store, config, report.seeded()).await?;

    if let Some(tv) = report.tv_panel {
        println!("✓ Created TV panel account {}", tv.email);
        println!("  Show its link with: clinicdesk tv-token show");
    }

    Ok(())
}

async fn print_report(store: &Store, config: &Config, seeded: bool) -> anyhow::Result<()> {
    if seeded {
        println!(
            "✓ Created administrator {} with the configured bootstrap password",
            config.bootstrap.admin_email
        );
        println!("  Sign in and change it from the profile page.");
    } else if !config.bootstrap.enabled {
        println!("Bootstrap disabled in config; no accounts seeded.");
    } else {
        println!(
            "Accounts already present ({} user(s)); nothing seeded.",
            store.count_users().await?
        );
    }

    Ok(())
}
