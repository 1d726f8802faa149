//! Review endpoints.

use axum::{
    Router,
    extract::{Path, Request, State},
    routing::{delete, get, post},
};
use haven_common::AppResult;
use haven_core::CreateReviewInput;
use haven_db::entities::review::Model as ReviewModel;
use serde::Serialize;
use serde_json::Value;

use crate::{middleware::AppState, multipart, response::ApiResponse};

/// Review response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub review: String,
    pub rating: i32,
    pub date: String,
    pub property: String,
    pub created_at: String,
}

impl From<ReviewModel> for ReviewResponse {
    fn from(model: ReviewModel) -> Self {
        Self {
            id: model.id,
            user: model.user_name,
            photo: model.photo,
            review: model.body,
            rating: model.rating,
            date: model.date,
            property: model.property_id,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
struct ReviewData {
    review: ReviewResponse,
}

/// Create a standalone review (JSON or multipart with a `photo` upload).
async fn create_review(
    State(state): State<AppState>,
    req: Request,
) -> AppResult<ApiResponse<ReviewData>> {
    let (input, photo) = if multipart::is_multipart(&req) {
        let form = multipart::collect_review_form(req, &state.store).await?;
        (CreateReviewInput::from_map(&form.fields), form.uploads.photo)
    } else {
        let fields = multipart::json_fields(req).await?;
        (CreateReviewInput::from_map(&fields), None)
    };

    let review = state.review_service.create(input, photo).await?;

    Ok(ApiResponse::created(
        "Review created successfully.",
        ReviewData {
            review: review.into(),
        },
    ))
}

/// List every review owned by a property.
async fn list_reviews(
    State(state): State<AppState>,
    Path(property_id): Path<String>,
) -> AppResult<ApiResponse<Vec<ReviewResponse>>> {
    let reviews = state.review_service.list_for_property(&property_id).await?;
    let data: Vec<ReviewResponse> = reviews.into_iter().map(Into::into).collect();
    let results = data.len();

    Ok(ApiResponse::ok("Reviews fetched successfully.", data).with_results(results))
}

/// Delete one review and its photo file.
async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Value>> {
    state.review_service.delete(&id).await?;

    Ok(ApiResponse::ok("Review deleted successfully.", Value::Null))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_review))
        .route("/property/{_id}", get(list_reviews))
        .route("/{_id}", delete(delete_review))
}
