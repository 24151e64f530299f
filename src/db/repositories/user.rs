use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::domain::{Role, UserId};
use crate::entities::{prelude::*, users};

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub staff_profile_id: Option<i32>,
    pub tv_token: Option<String>,
    pub last_access_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: UserId::new(model.id),
            name: model.name,
            email: model.email,
            role: model.role,
            active: model.active,
            staff_profile_id: model.staff_profile_id,
            tv_token: model.tv_token,
            last_access_at: model.last_access_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Row to insert. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub staff_profile_id: Option<i32>,
    pub tv_token: Option<String>,
}

/// Admin edit of an existing account. `password_hash` replaces the stored
/// hash only when set.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub active: bool,
    pub password_hash: Option<String>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    /// Get user by email together with the password hash (login path only)
    pub async fn get_by_email_with_password(&self, email: &str) -> Result<Option<(User, String)>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    pub async fn get_password_hash(&self, id: UserId) -> Result<Option<String>> {
        let user = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user password hash")?;

        Ok(user.map(|u| u.password_hash))
    }

    /// Active TV-panel account holding this token, if any
    pub async fn find_active_tv_user(&self, token: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::TvToken.eq(token))
            .filter(users::Column::Role.eq(Role::TvPanel))
            .filter(users::Column::Active.eq(true))
            .one(&self.conn)
            .await
            .context("Failed to query user by TV token")?;

        Ok(user.map(User::from))
    }

    pub async fn first_active_tv_user(&self) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Role.eq(Role::TvPanel))
            .filter(users::Column::Active.eq(true))
            .order_by_asc(users::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to query TV panel account")?;

        Ok(user.map(User::from))
    }

    /// All users, newest first
    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = Users::find()
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Users::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")
    }

    /// Insert a new user. Uniqueness of email and TV token is left to the
    /// store; a violation surfaces as a `DbErr` inside the returned error.
    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        let now = Utc::now();

        let active = users::ActiveModel {
            name: Set(new_user.name),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            role: Set(new_user.role),
            active: Set(true),
            staff_profile_id: Set(new_user.staff_profile_id),
            tv_token: Set(new_user.tv_token),
            last_access_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active.insert(&self.conn).await?;
        Ok(User::from(model))
    }

    pub async fn update(&self, id: UserId, update: UserUpdate) -> Result<Option<User>> {
        let Some(user) = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
        else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.name = Set(update.name);
        active.email = Set(update.email);
        active.active = Set(update.active);
        if let Some(hash) = update.password_hash {
            active.password_hash = Set(hash);
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.conn).await?;
        Ok(Some(User::from(model)))
    }

    /// Soft delete / reactivate. Returns false when the user does not exist.
    pub async fn set_active(&self, id: UserId, is_active: bool) -> Result<bool> {
        let Some(user) = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for activation change")?
        else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.active = Set(is_active);
        active.updated_at = Set(Utc::now());
        active.update(&self.conn).await?;

        Ok(true)
    }

    pub async fn update_password_hash(&self, id: UserId, password_hash: String) -> Result<()> {
        let user = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(password_hash);
        active.updated_at = Set(Utc::now());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Overwrites the stored TV token; the previous value stops validating.
    pub async fn set_tv_token(&self, id: UserId, token: &str) -> Result<()> {
        let user = Users::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user for TV token rotation")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut active: users::ActiveModel = user.into();
        active.tv_token = Set(Some(token.to_string()));
        active.updated_at = Set(Utc::now());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn touch_last_access(&self, id: UserId) -> Result<()> {
        Users::update_many()
            .col_expr(
                users::Column::LastAccessAt,
                sea_orm::sea_query::Expr::value(Some(Utc::now())),
            )
            .filter(users::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to update last access")?;

        Ok(())
    }
}
