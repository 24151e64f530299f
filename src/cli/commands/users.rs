//! Account maintenance commands

use anyhow::Context;

use super::open_user_admin;
use crate::config::Config;
use crate::domain::{Role, UserId, normalize_email};
use crate::services::tokens::generate_session_token;
use crate::services::{AccountUpdate, NewAccount, UserAdminService};

pub async fn cmd_users_list(config: &Config) -> anyhow::Result<()> {
    let (_, service) = open_user_admin(config).await?;
    let users = service.list_users().await?;

    if users.is_empty() {
        println!("No users yet.");
        println!();
        println!("Seed the first administrator with: clinicdesk init");
        return Ok(());
    }

    println!("Users ({} total)", users.len());
    println!("{:-<70}", "");

    for user in users {
        let marker = if user.active { "●" } else { "○" };
        println!("{} {} <{}>", marker, user.name, user.email);

        let last_access = user
            .last_access_at
            .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "  ID: {} | Role: {} | Last access: {}",
            user.id, user.role, last_access
        );
    }

    println!();
    println!("Legend: ● Active | ○ Deactivated");

    Ok(())
}

pub async fn cmd_users_create(
    config: &Config,
    name: &str,
    email: &str,
    role: &str,
    password: Option<&str>,
    staff_profile_id: Option<i32>,
) -> anyhow::Result<()> {
    let role: Role = role.parse()?;
    let (_, service) = open_user_admin(config).await?;

    let generated = password.is_none();
    let password = password.map_or_else(generate_password, str::to_string);

    let user = service
        .create_user(NewAccount {
            name: name.to_string(),
            email: email.to_string(),
            password: password.clone(),
            role,
            staff_profile_id,
        })
        .await?;

    println!("✓ Created {} (ID: {}, role: {})", user.email, user.id, user.role);
    if generated {
        println!("  Password: {password}");
    }
    if let Some(token) = &user.tv_token {
        println!("  TV token: {token}");
    }

    Ok(())
}

pub async fn cmd_users_reset_password(
    config: &Config,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let (store, service) = open_user_admin(config).await?;

    let user = store
        .get_user_by_email(&normalize_email(email))
        .await?
        .with_context(|| format!("No user with email {email}"))?;

    service
        .update_user(
            user.id,
            AccountUpdate {
                name: user.name,
                email: user.email.clone(),
                active: user.active,
                new_password: Some(password.to_string()),
            },
        )
        .await?;

    println!("✓ Password updated for {}", user.email);
    Ok(())
}

pub async fn cmd_users_deactivate(config: &Config, id: i32) -> anyhow::Result<()> {
    anyhow::ensure!(id > 0, "User ID must be a positive number, got {id}");

    let (_, service) = open_user_admin(config).await?;
    let id = UserId::new(id);

    let user = service.get_user(id).await?;
    if !user.active {
        println!("{} is already deactivated.", user.email);
        return Ok(());
    }

    service.deactivate_user(id).await?;
    println!("✓ Deactivated {} (ID: {})", user.email, user.id);
    println!("  Existing sessions stop working on their next request.");

    Ok(())
}

fn generate_password() -> String {
    generate_session_token()[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deactivate_rejects_non_positive_id_before_opening_database() {
        let mut config = Config::default();
        config.general.database_path = "/nonexistent/dir/clinic.db".to_string();

        for id in [0, -1] {
            let err = cmd_users_deactivate(&config, id).await.unwrap_err();
            assert!(err.to_string().contains("positive"));
        }
    }
}
