//! TV panel token commands

use super::open_user_admin;
use crate::config::Config;
use crate::db::User;
use crate::services::tokens::tv_panel_url;
use crate::services::{ClientInfo, UserAdminService};

pub async fn cmd_tv_token_show(config: &Config) -> anyhow::Result<()> {
    let (_, service) = open_user_admin(config).await?;
    let account = service.tv_panel_account().await?;

    print_panel_link(config, &account)
}

pub async fn cmd_tv_token_regenerate(config: &Config) -> anyhow::Result<()> {
    let (_, service) = open_user_admin(config).await?;

    let client = ClientInfo::new(None, Some("clinicdesk-cli".to_string()));
    let account = service.regenerate_tv_token(None, &client).await?;

    println!("✓ TV panel token regenerated; the previous link no longer works.");
    println!();
    print_panel_link(config, &account)
}

fn print_panel_link(config: &Config, account: &User) -> anyhow::Result<()> {
    println!("TV panel account: {} (ID: {})", account.name, account.id);
    println!("{:-<70}", "");

    match &account.tv_token {
        Some(token) => {
            println!("Token: {token}");
            println!("URL:   {}", tv_panel_url(&config.server.base_url(None), token)?);
        }
        None => println!("No token set. Run: clinicdesk tv-token regenerate"),
    }

    Ok(())
}
