//! Review service.

use chrono::Utc;
use haven_common::{AppError, AppResult, IdGenerator, ImageFolder, ImageStore};
use haven_db::{
    entities::review,
    repositories::{PropertyRepository, ReviewRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Input for creating a standalone review.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateReviewInput {
    pub user: Option<String>,
    pub username: Option<String>,
    pub photo: Option<String>,
    pub userphoto: Option<String>,
    pub review: Option<String>,
    #[serde(deserialize_with = "crate::ingest::loose_int")]
    pub rating: Option<i32>,
    pub date: Option<String>,
    /// Owning property id.
    pub property: Option<String>,
}

impl CreateReviewInput {
    /// Read the input from a request-body map (JSON object or form fields).
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        serde_json::from_value(Value::Object(map.clone())).unwrap_or_default()
    }
}

/// Review service for business logic.
#[derive(Clone)]
pub struct ReviewService {
    reviews: ReviewRepository,
    properties: PropertyRepository,
    store: ImageStore,
    id_gen: IdGenerator,
}

impl ReviewService {
    /// Create a new review service.
    #[must_use]
    pub const fn new(
        reviews: ReviewRepository,
        properties: PropertyRepository,
        store: ImageStore,
    ) -> Self {
        Self {
            reviews,
            properties,
            store,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a standalone review.
    ///
    /// The owning property must exist at creation time; the check is
    /// best-effort, not transactional. An uploaded photo filename wins over
    /// any filename carried in the body.
    pub async fn create(
        &self,
        input: CreateReviewInput,
        uploaded_photo: Option<String>,
    ) -> AppResult<review::Model> {
        let property_id = input
            .property
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                AppError::BadRequest("A review must reference a property.".to_string())
            })?;

        if self.properties.find_by_id(&property_id).await?.is_none() {
            return Err(AppError::NotFound("Property".to_string()));
        }

        let photo = uploaded_photo
            .or_else(|| input.userphoto.clone())
            .or_else(|| input.photo.clone());

        let model = review::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_name: Set(input
                .username
                .clone()
                .or_else(|| input.user.clone())
                .unwrap_or_default()),
            photo: Set(photo),
            body: Set(input.review.clone().unwrap_or_default()),
            rating: Set(input.rating.unwrap_or(0)),
            date: Set(input.date.clone().unwrap_or_default()),
            property_id: Set(property_id),
            created_at: Set(Utc::now().into()),
        };

        self.reviews.create(model).await
    }

    /// List every review owned by a property.
    pub async fn list_for_property(&self, property_id: &str) -> AppResult<Vec<review::Model>> {
        self.reviews.find_by_property(property_id).await
    }

    /// Delete one review and its photo file, if any.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let review = self.reviews.get_by_id(id).await?;

        if let Some(photo) = &review.photo {
            self.store.delete(ImageFolder::ReviewUsers, photo).await;
        }

        self.reviews.delete(&review.id).await
    }
}
