//! Property repository.

use std::sync::Arc;

use crate::entities::{Property, Review, property, review};
use haven_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, Order,
    QueryFilter, QueryOrder, TransactionTrait,
};

/// One review mutation carried by a property update.
#[derive(Debug, Clone)]
pub enum ReviewWrite {
    /// Insert a new review owned by the property.
    Create(review::ActiveModel),
    /// Update an existing review; a vanished id is skipped, not an error.
    Update(review::ActiveModel),
    /// Delete the review with this id.
    Delete(String),
}

/// Property repository for database operations.
#[derive(Clone)]
pub struct PropertyRepository {
    db: Arc<DatabaseConnection>,
}

impl PropertyRepository {
    /// Create a new property repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a property by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<property::Model>> {
        Property::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a property by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<property::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property".to_string()))
    }

    /// List properties matching a prebuilt filter, optionally ordered.
    pub async fn list(
        &self,
        condition: Condition,
        order: Option<(property::Column, Order)>,
    ) -> AppResult<Vec<property::Model>> {
        let mut query = Property::find().filter(condition);

        if let Some((column, direction)) = order {
            query = query.order_by(column, direction);
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a property.
    pub async fn update(&self, model: property::ActiveModel) -> AppResult<property::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a property together with its reviews in one transaction.
    pub async fn create_with_reviews(
        &self,
        property: property::ActiveModel,
        reviews: Vec<review::ActiveModel>,
    ) -> AppResult<(property::Model, Vec<review::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let property = property
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut created = Vec::with_capacity(reviews.len());
        for model in reviews {
            created.push(
                model
                    .insert(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?,
            );
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((property, created))
    }

    /// Apply a property update and its review mutations in one transaction.
    ///
    /// Returns the updated property and the reviews that were created or
    /// updated (deletions and vanished update targets are not reported).
    pub async fn update_with_reviews(
        &self,
        property: property::ActiveModel,
        writes: Vec<ReviewWrite>,
    ) -> AppResult<(property::Model, Vec<review::Model>)> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let property = property
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut touched = Vec::new();
        for write in writes {
            match write {
                ReviewWrite::Create(model) => {
                    touched.push(
                        model
                            .insert(&txn)
                            .await
                            .map_err(|e| AppError::Database(e.to_string()))?,
                    );
                }
                ReviewWrite::Update(model) => match model.update(&txn).await {
                    Ok(updated) => touched.push(updated),
                    Err(DbErr::RecordNotUpdated) => {}
                    Err(e) => return Err(AppError::Database(e.to_string())),
                },
                ReviewWrite::Delete(id) => {
                    Review::delete_by_id(&id)
                        .exec(&txn)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                }
            }
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((property, touched))
    }

    /// Delete a property and every review it owns in one transaction.
    pub async fn delete_cascade(&self, id: &str) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Review::delete_many()
            .filter(review::Column::PropertyId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Property::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
