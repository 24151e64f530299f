use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::domain::AccessAction;

/// Append-only audit row. Never updated or deleted by the application.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "access_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Null for failed logins with an unknown identity, or once the user is removed
    pub user_id: Option<i32>,

    pub action: AccessAction,

    pub client_address: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub client_agent: Option<String>,

    pub detail: Option<Json>,

    pub success: bool,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
