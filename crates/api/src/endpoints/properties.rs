//! Property endpoints.

use std::collections::HashMap;

use axum::{
    Router,
    extract::{Path, Query, Request, State},
    routing::{get, patch},
};
use haven_common::AppResult;
use haven_core::{PropertyPayload, UploadSet};
use haven_db::entities::property::Model as PropertyModel;
use serde::Serialize;
use serde_json::Value;

use super::reviews::ReviewResponse;
use crate::{middleware::AppState, multipart, response::ApiResponse};

/// Property response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResponse {
    pub id: String,
    pub title: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub images: Value,
    pub details: PropertyDetails,
    pub features: Value,
    pub amenities: Value,
    pub rating: PropertyRating,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Structural details group.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetails {
    pub bedrooms: i32,
    pub beds: i32,
    pub bathrooms: i32,
    pub max_guests: i32,
}

/// Aggregate rating group.
#[derive(Debug, Serialize)]
pub struct PropertyRating {
    pub average: f64,
    pub count: i32,
}

impl From<PropertyModel> for PropertyResponse {
    fn from(model: PropertyModel) -> Self {
        Self {
            id: model.id,
            title: model.title,
            address: model.address,
            description: model.description,
            images: model.images,
            details: PropertyDetails {
                bedrooms: model.bedrooms,
                beds: model.beds,
                bathrooms: model.bathrooms,
                max_guests: model.max_guests,
            },
            features: model.features,
            amenities: model.amenities,
            rating: PropertyRating {
                average: model.rating_average,
                count: model.rating_count,
            },
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// A property populated with its reviews.
#[derive(Serialize)]
struct PopulatedProperty {
    #[serde(flatten)]
    property: PropertyResponse,
    reviews: Vec<ReviewResponse>,
}

#[derive(Serialize)]
struct PropertyData {
    property: PopulatedProperty,
}

#[derive(Serialize)]
struct PropertyWithReviews {
    property: PropertyResponse,
    reviews: Vec<ReviewResponse>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplacedImages {
    new_property: PropertyResponse,
}

/// List properties, filtered and sorted by the query string.
async fn list_properties(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<ApiResponse<Vec<PropertyResponse>>> {
    let properties = state.property_service.list(&params).await?;
    let data: Vec<PropertyResponse> = properties.into_iter().map(Into::into).collect();
    let results = data.len();

    Ok(ApiResponse::ok("Properties fetched successfully.", data).with_results(results))
}

/// Fetch one property populated with its reviews.
async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PropertyData>> {
    let (property, reviews) = state.property_service.get(&id).await?;

    Ok(ApiResponse::ok(
        "Property fetched successfully.",
        PropertyData {
            property: PopulatedProperty {
                property: property.into(),
                reviews: reviews.into_iter().map(Into::into).collect(),
            },
        },
    ))
}

/// Create a property (JSON or multipart) with its embedded reviews.
async fn create_property(
    State(state): State<AppState>,
    req: Request,
) -> AppResult<ApiResponse<PropertyWithReviews>> {
    let (payload, uploads) = read_property_request(&state, req).await?;
    let (property, reviews) = state.property_service.create(payload, uploads).await?;

    Ok(ApiResponse::created(
        "Property created successfully.",
        PropertyWithReviews {
            property: property.into(),
            reviews: reviews.into_iter().map(Into::into).collect(),
        },
    ))
}

/// Update a property, its image set, and its reviews.
async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Request,
) -> AppResult<ApiResponse<PropertyWithReviews>> {
    let (payload, uploads) = read_property_request(&state, req).await?;
    let (property, reviews, images_updated) =
        state.property_service.update(&id, payload, uploads).await?;

    let message = if images_updated {
        "Property, images, and reviews updated successfully."
    } else {
        "Property and reviews updated successfully."
    };

    Ok(ApiResponse::ok(
        message,
        PropertyWithReviews {
            property: property.into(),
            reviews: reviews.into_iter().map(Into::into).collect(),
        },
    ))
}

/// Replace a property's image set wholesale.
async fn update_property_images(
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Request,
) -> AppResult<ApiResponse<ReplacedImages>> {
    let uploads = if multipart::is_multipart(&req) {
        multipart::collect_property_form(req, &state.store)
            .await?
            .uploads
            .images
    } else {
        Vec::new()
    };

    let property = state.property_service.replace_images(&id, uploads).await?;

    Ok(ApiResponse::ok(
        "Images updated successfully.",
        ReplacedImages {
            new_property: property.into(),
        },
    ))
}

/// Delete a property, cascading to its reviews and image files.
async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Value>> {
    state.property_service.delete(&id).await?;

    Ok(ApiResponse::ok(
        "Property deleted successfully.",
        Value::Null,
    ))
}

/// Read the create/update body: multipart stores uploads as it streams,
/// JSON contributes no uploads; both reduce to the same normalized payload.
async fn read_property_request(
    state: &AppState,
    req: Request,
) -> AppResult<(PropertyPayload, UploadSet)> {
    if multipart::is_multipart(&req) {
        let form = multipart::collect_property_form(req, &state.store).await?;
        Ok((PropertyPayload::from_map(&form.fields), form.uploads))
    } else {
        let fields = multipart::json_fields(req).await?;
        Ok((PropertyPayload::from_map(&fields), UploadSet::default()))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_properties).post(create_property))
        .route(
            "/{_id}",
            get(get_property)
                .patch(update_property)
                .delete(delete_property),
        )
        .route("/update-images/{_id}", patch(update_property_images))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use chrono::Utc;
    use haven_common::{ImageStore, config::AuthConfig};
    use haven_core::{PropertyService, ReviewService, UserService};
    use haven_db::entities::property;
    use haven_db::repositories::{PropertyRepository, ReviewRepository, UserRepository};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(db: Arc<DatabaseConnection>, dir: &std::path::Path) -> AppState {
        let store = ImageStore::new(dir);
        AppState {
            property_service: PropertyService::new(
                PropertyRepository::new(Arc::clone(&db)),
                ReviewRepository::new(Arc::clone(&db)),
                store.clone(),
            ),
            review_service: ReviewService::new(
                ReviewRepository::new(Arc::clone(&db)),
                PropertyRepository::new(Arc::clone(&db)),
                store.clone(),
            ),
            user_service: UserService::new(UserRepository::new(db)),
            store,
            auth: AuthConfig {
                jwt_secret: "test-secret".to_string(),
                token_valid_days: 7,
                cookie_domain: None,
                cookie_secure: true,
            },
        }
    }

    fn test_property(id: &str) -> property::Model {
        property::Model {
            id: id.to_string(),
            title: "Seaside Villa".to_string(),
            address: "1 Shore Road".to_string(),
            description: None,
            images: json!(["a.jpg"]),
            bedrooms: 3,
            beds: 3,
            bathrooms: 2,
            max_guests: 6,
            features: json!([]),
            amenities: json!([{"name": "Pool", "icon": "FaSwimmingPool"}]),
            rating_average: 4.5,
            rating_count: 2,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_property("prop1"), test_property("prop2")]])
                .into_connection(),
        );
        let app = router().with_state(test_state(db, dir.path()));

        let request = HttpRequest::builder()
            .method("GET")
            .uri("/?bedrooms%5Bgte%5D=2&sortBy=recent")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Properties fetched successfully.");
        assert_eq!(body["results"], 2);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"][0]["details"]["maxGuests"], 6);
        assert_eq!(body["data"][0]["rating"]["average"], 4.5);
    }

    #[tokio::test]
    async fn test_get_missing_property_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<property::Model>::new()])
                .into_connection(),
        );
        let app = router().with_state(test_state(db, dir.path()));

        let request = HttpRequest::builder()
            .method("GET")
            .uri("/ghost")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(body["error"], "Property not found");
    }

    #[tokio::test]
    async fn test_get_populates_reviews() {
        let dir = tempfile::tempdir().unwrap();
        let review = haven_db::entities::review::Model {
            id: "rev1".to_string(),
            user_name: "Ada".to_string(),
            photo: None,
            body: "Lovely stay".to_string(),
            rating: 5,
            date: String::new(),
            property_id: "prop1".to_string(),
            created_at: Utc::now().into(),
        };
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_property("prop1")]])
                .append_query_results([[review]])
                .into_connection(),
        );
        let app = router().with_state(test_state(db, dir.path()));

        let request = HttpRequest::builder()
            .method("GET")
            .uri("/prop1")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let property = &body["data"]["property"];
        assert_eq!(property["title"], "Seaside Villa");
        assert_eq!(property["reviews"][0]["user"], "Ada");
        assert_eq!(property["reviews"][0]["review"], "Lovely stay");
    }
}
