//! Create `property` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Property::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Property::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Property::Title).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Property::Address)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Property::Description).text())
                    .col(
                        ColumnDef::new(Property::Images)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Property::Bedrooms)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Property::Beds)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Property::Bathrooms)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Property::MaxGuests)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Property::Features)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Property::Amenities)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Property::RatingAverage)
                            .double()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Property::RatingCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Property::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Property::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Index: created_at (recency sort)
        manager
            .create_index(
                Index::create()
                    .name("idx_property_created_at")
                    .table(Property::Table)
                    .col(Property::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: rating_average (rating sort)
        manager
            .create_index(
                Index::create()
                    .name("idx_property_rating_average")
                    .table(Property::Table)
                    .col(Property::RatingAverage)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Property::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Property {
    Table,
    Id,
    Title,
    Address,
    Description,
    Images,
    Bedrooms,
    Beds,
    Bathrooms,
    MaxGuests,
    Features,
    Amenities,
    RatingAverage,
    RatingCount,
    CreatedAt,
    UpdatedAt,
}
