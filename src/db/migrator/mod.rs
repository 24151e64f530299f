use sea_orm_migration::prelude::*;

mod m20260301_create_access_logs;
mod m20260301_create_user_sessions;
mod m20260301_create_users;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_create_users::Migration),
            Box::new(m20260301_create_user_sessions::Migration),
            Box::new(m20260301_create_access_logs::Migration),
        ]
    }
}
