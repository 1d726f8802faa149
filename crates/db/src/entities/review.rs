//! Review entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A guest testimonial attached to one property.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Guest display name.
    pub user_name: String,

    /// Stored photo filename, if the guest supplied one.
    #[sea_orm(nullable)]
    pub photo: Option<String>,

    /// Review text.
    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Star rating, nominally 1-5. Not enforced server-side.
    #[sea_orm(default_value = 0)]
    pub rating: i32,

    /// Display date, free-form as supplied by the client.
    #[sea_orm(default_value = "")]
    pub date: String,

    /// Owning property.
    #[sea_orm(indexed)]
    pub property_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::property::Entity",
        from = "Column::PropertyId",
        to = "super::property::Column::Id",
        on_delete = "Cascade"
    )]
    Property,
}

impl Related<super::property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Property.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
