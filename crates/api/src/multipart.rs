//! Multipart form collection.
//!
//! Reduces a multipart body to the same flat field map a JSON body
//! produces, storing image uploads through the [`ImageStore`] as they
//! stream; only the assigned filenames travel onward, never the raw
//! bytes.

use axum::extract::{FromRequest, Multipart, Request};
use haven_common::{AppError, AppResult, ImageFolder, ImageStore};
use haven_core::ingest::UploadSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Pattern of a per-review image field: `reviewImages[<idx>]`.
#[allow(clippy::expect_used)]
static REVIEW_IMAGE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^reviewImages\[(\d+)\]$").expect("review image field pattern is valid"));

/// A collected form: flat text fields plus stored uploads.
#[derive(Debug, Default)]
pub struct CollectedForm {
    /// Text fields, keyed by their literal (possibly bracketed) names.
    pub fields: Map<String, Value>,
    /// Filenames assigned to this request's uploads.
    pub uploads: UploadSet,
}

/// Whether the request body is multipart form data.
#[must_use]
pub fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.starts_with("multipart/form-data"))
}

/// Read a JSON request body into the flat field map.
pub async fn json_fields(req: Request) -> AppResult<Map<String, Value>> {
    let axum::Json(map) = axum::Json::<Map<String, Value>>::from_request(req, &())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(map)
}

/// Collect a property create/update form.
///
/// `images` uploads and `reviewImages[<idx>]` uploads are stored in the
/// properties folder; any other file field is drained and ignored. Text
/// fields keep their literal names for the normalizer's bracket scan.
pub async fn collect_property_form(req: Request, store: &ImageStore) -> AppResult<CollectedForm> {
    let mut multipart = multipart_body(req).await?;
    let mut form = CollectedForm::default();

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or("").to_string();

        if let Some(file_name) = field.file_name().map(ToString::to_string) {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;

            if name == "images" {
                let stored = store
                    .save(ImageFolder::Properties, &file_name, &content_type, &data)
                    .await?;
                form.uploads.images.push(stored);
            } else if let Some(caps) = REVIEW_IMAGE_FIELD.captures(&name) {
                if let Ok(idx) = caps[1].parse::<usize>() {
                    let stored = store
                        .save(ImageFolder::Properties, &file_name, &content_type, &data)
                        .await?;
                    form.uploads.review_images.insert(idx, stored);
                }
            }
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.fields.insert(name, Value::String(text));
        }
    }

    Ok(form)
}

/// Collect a standalone review form; the `photo` upload goes to the
/// reviews-users folder.
pub async fn collect_review_form(req: Request, store: &ImageStore) -> AppResult<CollectedForm> {
    let mut multipart = multipart_body(req).await?;
    let mut form = CollectedForm::default();

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or("").to_string();

        if let Some(file_name) = field.file_name().map(ToString::to_string) {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;

            if name == "photo" {
                let stored = store
                    .save(ImageFolder::ReviewUsers, &file_name, &content_type, &data)
                    .await?;
                form.uploads.photo = Some(stored);
            }
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.fields.insert(name, Value::String(text));
        }
    }

    Ok(form)
}

async fn multipart_body(req: Request) -> AppResult<Multipart> {
    Multipart::from_request(req, &())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn next_field(
    multipart: &mut Multipart,
) -> AppResult<Option<axum::extract::multipart::Field<'_>>> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}
