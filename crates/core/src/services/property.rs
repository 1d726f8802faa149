//! Property service.

use std::collections::HashMap;

use chrono::Utc;
use futures::future::join_all;
use haven_common::{AppError, AppResult, IdGenerator, ImageFolder, ImageStore};
use haven_db::{
    entities::{property, review},
    repositories::{PropertyRepository, ReviewRepository, ReviewWrite},
};
use sea_orm::{ActiveValue::Unchanged, Set};
use serde_json::Value;

use crate::ingest::{PropertyPayload, ReviewPayload, UploadSet, image_filenames, stale_images};
use crate::query::ListQuery;

/// Property service for business logic.
#[derive(Clone)]
pub struct PropertyService {
    properties: PropertyRepository,
    reviews: ReviewRepository,
    store: ImageStore,
    id_gen: IdGenerator,
}

impl PropertyService {
    /// Create a new property service.
    #[must_use]
    pub const fn new(
        properties: PropertyRepository,
        reviews: ReviewRepository,
        store: ImageStore,
    ) -> Self {
        Self {
            properties,
            reviews,
            store,
            id_gen: IdGenerator::new(),
        }
    }

    /// List properties matching the raw query-string parameters.
    pub async fn list(
        &self,
        params: &HashMap<String, String>,
    ) -> AppResult<Vec<property::Model>> {
        let query = ListQuery::from_params(params);
        let order = query.order();
        self.properties.list(query.to_condition(), order).await
    }

    /// Fetch one property together with its reviews.
    pub async fn get(&self, id: &str) -> AppResult<(property::Model, Vec<review::Model>)> {
        let property = self.properties.get_by_id(id).await?;
        let reviews = self.reviews.find_by_property(id).await?;
        Ok((property, reviews))
    }

    /// Create a property and its embedded reviews in one transaction.
    ///
    /// Uploaded filenames win over any `images` body field; review photos
    /// come from the `reviewImages[<idx>]` uploads, falling back to
    /// filenames carried in the review payload itself.
    pub async fn create(
        &self,
        payload: PropertyPayload,
        uploads: UploadSet,
    ) -> AppResult<(property::Model, Vec<review::Model>)> {
        let images = if uploads.images.is_empty() {
            payload.images.clone().unwrap_or_default()
        } else {
            uploads.images.clone()
        };

        let property_id = self.id_gen.generate();
        let now = Utc::now();

        let review_models: Vec<review::ActiveModel> = payload
            .reviews
            .clone()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(idx, review)| self.new_review_model(&property_id, idx, review, &uploads))
            .collect();

        let rating = payload.rating.unwrap_or_default();
        let model = property::ActiveModel {
            id: Set(property_id),
            title: Set(payload.title.unwrap_or_default()),
            address: Set(payload.address.unwrap_or_default()),
            description: Set(payload.description),
            images: Set(to_json(&images)?),
            bedrooms: Set(payload.details.bedrooms.unwrap_or(0)),
            beds: Set(payload.details.beds.unwrap_or(0)),
            bathrooms: Set(payload.details.bathrooms.unwrap_or(0)),
            max_guests: Set(payload.details.max_guests.unwrap_or(0)),
            features: Set(to_json(&payload.features.unwrap_or_default())?),
            amenities: Set(to_json(&payload.amenities.unwrap_or_default())?),
            rating_average: Set(rating.average.unwrap_or(0.0)),
            rating_count: Set(rating.count.unwrap_or(0)),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        self.properties
            .create_with_reviews(model, review_models)
            .await
    }

    /// Update a property, its image set, and its reviews.
    ///
    /// The next image set is the client-retained list (`existingImages`,
    /// else an `images` body field, else the stored set) plus any new
    /// uploads; stored filenames that fall out of the set are unlinked
    /// after the transaction commits. Returns the updated property, the
    /// reviews that were created or updated, and whether new image files
    /// arrived.
    pub async fn update(
        &self,
        id: &str,
        payload: PropertyPayload,
        uploads: UploadSet,
    ) -> AppResult<(property::Model, Vec<review::Model>, bool)> {
        let existing = self.properties.get_by_id(id).await?;
        let current_images = image_filenames(&existing.images);

        let mut next_images = payload
            .existing_images
            .clone()
            .or_else(|| payload.images.clone())
            .unwrap_or_else(|| current_images.clone());
        let images_updated = !uploads.images.is_empty();
        next_images.extend(uploads.images.iter().cloned());

        let stale = stale_images(&current_images, &next_images);

        let mut active: property::ActiveModel = existing.into();
        if let Some(title) = payload.title.clone() {
            active.title = Set(title);
        }
        if let Some(address) = payload.address.clone() {
            active.address = Set(address);
        }
        if let Some(description) = payload.description.clone() {
            active.description = Set(Some(description));
        }
        if let Some(bedrooms) = payload.details.bedrooms {
            active.bedrooms = Set(bedrooms);
        }
        if let Some(beds) = payload.details.beds {
            active.beds = Set(beds);
        }
        if let Some(bathrooms) = payload.details.bathrooms {
            active.bathrooms = Set(bathrooms);
        }
        if let Some(max_guests) = payload.details.max_guests {
            active.max_guests = Set(max_guests);
        }
        if let Some(features) = payload.features.clone() {
            active.features = Set(to_json(&features)?);
        }
        if let Some(amenities) = payload.amenities.clone() {
            active.amenities = Set(to_json(&amenities)?);
        }
        if let Some(rating) = payload.rating {
            if let Some(average) = rating.average {
                active.rating_average = Set(average);
            }
            if let Some(count) = rating.count {
                active.rating_count = Set(count);
            }
        }
        active.images = Set(to_json(&next_images)?);
        active.updated_at = Set(Some(Utc::now().into()));

        let writes: Vec<ReviewWrite> = payload
            .reviews
            .clone()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .filter_map(|(idx, review)| self.review_write(id, idx, review, &uploads))
            .collect();

        let (property, touched) = self.properties.update_with_reviews(active, writes).await?;

        if !stale.is_empty() {
            tracing::debug!(count = stale.len(), "Unlinking images dropped from the set");
        }
        join_all(
            stale
                .iter()
                .map(|file| self.store.delete(ImageFolder::Properties, file)),
        )
        .await;

        Ok((property, touched, images_updated))
    }

    /// Replace a property's image set wholesale with freshly-uploaded files.
    pub async fn replace_images(
        &self,
        id: &str,
        uploads: Vec<String>,
    ) -> AppResult<property::Model> {
        let existing = self.properties.get_by_id(id).await?;
        let current_images = image_filenames(&existing.images);

        let mut active: property::ActiveModel = existing.into();
        active.images = Set(to_json(&uploads)?);
        active.updated_at = Set(Some(Utc::now().into()));

        let property = self.properties.update(active).await?;

        join_all(
            current_images
                .iter()
                .map(|file| self.store.delete(ImageFolder::Properties, file)),
        )
        .await;

        Ok(property)
    }

    /// Delete a property, cascading to its reviews and image files.
    ///
    /// Every review photo and property image is unlinked concurrently,
    /// best-effort; the record deletions proceed regardless of file
    /// failures.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let property = self.properties.get_by_id(id).await?;
        let reviews = self.reviews.find_by_property(id).await?;

        let mut files: Vec<String> = reviews
            .iter()
            .filter_map(|review| review.photo.clone())
            .collect();
        files.extend(image_filenames(&property.images));

        join_all(
            files
                .iter()
                .map(|file| self.store.delete(ImageFolder::Properties, file)),
        )
        .await;

        self.properties.delete_cascade(id).await
    }

    /// Build the model for a review embedded in a property create.
    fn new_review_model(
        &self,
        property_id: &str,
        idx: usize,
        payload: &ReviewPayload,
        uploads: &UploadSet,
    ) -> review::ActiveModel {
        let photo_slot = payload.photo_index.unwrap_or(idx);
        let photo = uploads
            .review_images
            .get(&photo_slot)
            .cloned()
            .or_else(|| payload.fallback_photo());

        review::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_name: Set(payload.display_name()),
            photo: Set(photo),
            body: Set(payload.review.clone().unwrap_or_default()),
            rating: Set(payload.rating.unwrap_or(0)),
            date: Set(payload.date.clone().unwrap_or_default()),
            property_id: Set(property_id.to_string()),
            created_at: Set(Utc::now().into()),
        }
    }

    /// Map a review sub-object on update to its mutation.
    ///
    /// A freshly-uploaded `reviewImages` file at the review's slot wins over
    /// any filename carried in the payload. A `delete` flag needs an id to
    /// act on; without one the entry is a no-op rather than an accidental
    /// create.
    fn review_write(
        &self,
        property_id: &str,
        idx: usize,
        payload: &ReviewPayload,
        uploads: &UploadSet,
    ) -> Option<ReviewWrite> {
        let photo_slot = payload.photo_index.unwrap_or(idx);
        let uploaded = uploads.review_images.get(&photo_slot).cloned();

        match (payload.delete, payload.id.clone()) {
            (true, Some(id)) => Some(ReviewWrite::Delete(id)),
            (true, None) => None,
            (false, Some(id)) => Some(ReviewWrite::Update(review::ActiveModel {
                id: Unchanged(id),
                user_name: Set(payload.display_name()),
                photo: Set(uploaded.or_else(|| payload.stored_photo())),
                body: Set(payload.review.clone().unwrap_or_default()),
                rating: Set(payload.rating.unwrap_or(0)),
                date: Set(payload.date.clone().unwrap_or_default()),
                ..Default::default()
            })),
            (false, None) => Some(ReviewWrite::Create(review::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_name: Set(payload.display_name()),
                photo: Set(uploaded.or_else(|| payload.fallback_photo())),
                body: Set(payload.review.clone().unwrap_or_default()),
                rating: Set(payload.rating.unwrap_or(0)),
                date: Set(payload.date.clone().unwrap_or_default()),
                property_id: Set(property_id.to_string()),
                created_at: Set(Utc::now().into()),
            })),
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::sync::Arc;

    fn test_property(id: &str, images: Value) -> property::Model {
        property::Model {
            id: id.to_string(),
            title: "Seaside Villa".to_string(),
            address: "1 Shore Road".to_string(),
            description: None,
            images,
            bedrooms: 2,
            beds: 2,
            bathrooms: 1,
            max_guests: 4,
            features: json!([]),
            amenities: json!([]),
            rating_average: 0.0,
            rating_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_review(id: &str, property_id: &str, photo: Option<&str>) -> review::Model {
        review::Model {
            id: id.to_string(),
            user_name: "Ada".to_string(),
            photo: photo.map(str::to_string),
            body: "Lovely stay".to_string(),
            rating: 5,
            date: String::new(),
            property_id: property_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    async fn seed_image(store_dir: &std::path::Path, name: &str) {
        let dir = store_dir.join(ImageFolder::Properties.as_path());
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join(name), b"img").await.unwrap();
    }

    #[tokio::test]
    async fn test_update_deletes_exactly_the_dropped_image() {
        let dir = tempfile::tempdir().unwrap();
        seed_image(dir.path(), "a.jpg").await;
        seed_image(dir.path(), "b.jpg").await;

        let existing = test_property("prop1", json!(["a.jpg", "b.jpg"]));
        let updated = test_property("prop1", json!(["b.jpg", "c.jpg"]));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // get_by_id
                .append_query_results([[existing]])
                // transactional property update
                .append_query_results([[updated]])
                .into_connection(),
        );

        let service = PropertyService::new(
            PropertyRepository::new(Arc::clone(&db)),
            ReviewRepository::new(db),
            ImageStore::new(dir.path()),
        );

        let payload = PropertyPayload {
            existing_images: Some(vec!["b.jpg".to_string()]),
            ..PropertyPayload::default()
        };
        let uploads = UploadSet {
            images: vec!["c.jpg".to_string()],
            ..UploadSet::default()
        };

        let (property, _, images_updated) =
            service.update("prop1", payload, uploads).await.unwrap();

        assert!(images_updated);
        assert_eq!(image_filenames(&property.images), vec!["b.jpg", "c.jpg"]);

        let folder = dir.path().join(ImageFolder::Properties.as_path());
        assert!(!folder.join("a.jpg").exists(), "a.jpg should be unlinked");
        assert!(folder.join("b.jpg").exists(), "b.jpg must be untouched");
    }

    #[tokio::test]
    async fn test_delete_cascades_files_reviews_and_property() {
        let dir = tempfile::tempdir().unwrap();
        // Only two of the three referenced files exist on disk; the missing
        // one produces a logged unlink failure that must not stop anything.
        seed_image(dir.path(), "a.jpg").await;
        seed_image(dir.path(), "ada.jpg").await;

        let property = test_property("prop1", json!(["a.jpg", "b.jpg"]));
        let review = test_review("rev1", "prop1", Some("ada.jpg"));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[property]])
                .append_query_results([[review]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let service = PropertyService::new(
            PropertyRepository::new(Arc::clone(&db)),
            ReviewRepository::new(db),
            ImageStore::new(dir.path()),
        );

        service.delete("prop1").await.unwrap();

        let folder = dir.path().join(ImageFolder::Properties.as_path());
        assert!(!folder.join("a.jpg").exists());
        assert!(!folder.join("ada.jpg").exists());
    }

    #[tokio::test]
    async fn test_get_missing_property_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<property::Model>::new()])
                .into_connection(),
        );

        let dir = tempfile::tempdir().unwrap();
        let service = PropertyService::new(
            PropertyRepository::new(Arc::clone(&db)),
            ReviewRepository::new(db),
            ImageStore::new(dir.path()),
        );

        let result = service.get("ghost").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_review_write_mapping() {
        let dir = std::env::temp_dir();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );
        let service = PropertyService::new(
            PropertyRepository::new(Arc::clone(&db)),
            ReviewRepository::new(db),
            ImageStore::new(dir),
        );

        let uploads = UploadSet::default();

        let delete = ReviewPayload {
            id: Some("rev1".to_string()),
            delete: true,
            ..ReviewPayload::default()
        };
        assert!(matches!(
            service.review_write("prop1", 0, &delete, &uploads),
            Some(ReviewWrite::Delete(id)) if id == "rev1"
        ));

        let update = ReviewPayload {
            id: Some("rev2".to_string()),
            ..ReviewPayload::default()
        };
        assert!(matches!(
            service.review_write("prop1", 0, &update, &uploads),
            Some(ReviewWrite::Update(_))
        ));

        let create = ReviewPayload::default();
        assert!(matches!(
            service.review_write("prop1", 0, &create, &uploads),
            Some(ReviewWrite::Create(_))
        ));

        let orphan_delete = ReviewPayload {
            delete: true,
            ..ReviewPayload::default()
        };
        assert!(service.review_write("prop1", 0, &orphan_delete, &uploads).is_none());
    }

    #[test]
    fn test_review_write_uploaded_photo_wins() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );
        let service = PropertyService::new(
            PropertyRepository::new(Arc::clone(&db)),
            ReviewRepository::new(db),
            ImageStore::new(std::env::temp_dir()),
        );

        let mut uploads = UploadSet::default();
        uploads
            .review_images
            .insert(1, "fresh-1700000000000.jpg".to_string());

        // photoIndex points at the upload even when the review sits at
        // another position.
        let create = ReviewPayload {
            photo: Some("carried.jpg".to_string()),
            photo_index: Some(1),
            ..ReviewPayload::default()
        };
        match service.review_write("prop1", 0, &create, &uploads) {
            Some(ReviewWrite::Create(model)) => {
                assert_eq!(
                    model.photo,
                    Set(Some("fresh-1700000000000.jpg".to_string()))
                );
            }
            other => panic!("Expected Create, got {other:?}"),
        }

        // Without an upload at its slot the carried filename is kept.
        let keep = ReviewPayload {
            id: Some("rev1".to_string()),
            photo: Some("carried.jpg".to_string()),
            ..ReviewPayload::default()
        };
        match service.review_write("prop1", 0, &keep, &uploads) {
            Some(ReviewWrite::Update(model)) => {
                assert_eq!(model.photo, Set(Some("carried.jpg".to_string())));
            }
            other => panic!("Expected Update, got {other:?}"),
        }
    }
}
