//! Create `review` table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Review::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Review::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Review::UserName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Review::Photo).string_len(512))
                    .col(ColumnDef::new(Review::Body).text().not_null())
                    .col(
                        ColumnDef::new(Review::Rating)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Review::Date)
                            .string_len(128)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Review::PropertyId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Review::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_property")
                            .from(Review::Table, Review::PropertyId)
                            .to(Property::Table, Property::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: property_id (listing a property's reviews)
        manager
            .create_index(
                Index::create()
                    .name("idx_review_property_id")
                    .table(Review::Table)
                    .col(Review::PropertyId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Review::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Review {
    Table,
    Id,
    UserName,
    Photo,
    Body,
    Rating,
    Date,
    PropertyId,
    CreatedAt,
}

#[derive(Iden)]
enum Property {
    Table,
    Id,
}
