//! Property entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A rental listing: images, structural details, features, and amenities.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "property")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    pub address: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Ordered list of stored image filenames.
    #[sea_orm(column_type = "JsonBinary")]
    pub images: Json,

    #[sea_orm(default_value = 0)]
    pub bedrooms: i32,

    #[sea_orm(default_value = 0)]
    pub beds: i32,

    #[sea_orm(default_value = 0)]
    pub bathrooms: i32,

    #[sea_orm(default_value = 0)]
    pub max_guests: i32,

    /// Structured highlights: `{name, description, icon}` objects.
    #[sea_orm(column_type = "JsonBinary")]
    pub features: Json,

    /// Facility tags: `{name, icon}` objects.
    #[sea_orm(column_type = "JsonBinary")]
    pub amenities: Json,

    pub rating_average: f64,

    #[sea_orm(default_value = 0)]
    pub rating_count: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
