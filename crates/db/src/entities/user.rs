//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An account used solely for authentication; no other entity references it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 password hash. Write-only: never serialized into responses.
    #[serde(skip_serializing)]
    pub password: String,

    /// `admin` or `user`.
    #[sea_orm(default_value = "user")]
    pub role: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
