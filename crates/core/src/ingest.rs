//! Property request-body normalization.
//!
//! A create/update body arrives either as JSON or as flattened multipart
//! form fields, and in either shape `features`, `amenities`, and `reviews`
//! may be structured arrays, a single JSON-encoded string, or
//! bracket-indexed flat fields (`amenities[0][name]`, `amenities[0][icon]`,
//! …). Both sources are reduced to one `serde_json` map up front, so a
//! single set of discriminated-union parsers handles every shape.
//!
//! Parse failures degrade silently: a string field that is not valid JSON
//! becomes an empty list, and a single amenity/feature string becomes a
//! one-entry list carrying the string as its name. Nothing here raises to
//! the caller.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Icon assigned when the client did not pick one.
pub const DEFAULT_ICON: &str = "FaPlus";

/// A structured highlight of a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feature {
    pub name: String,
    pub description: String,
    pub icon: String,
}

impl Default for Feature {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            icon: DEFAULT_ICON.to_string(),
        }
    }
}

/// A facility tag of a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Amenity {
    pub name: String,
    pub icon: String,
}

impl Default for Amenity {
    fn default() -> Self {
        Self {
            name: String::new(),
            icon: DEFAULT_ICON.to_string(),
        }
    }
}

/// A review sub-object carried by a property create/update request.
///
/// The client-side shape is loose: the display name may arrive as
/// `username` or `user`, the photo as `userphoto` or `photo`, and numeric
/// fields may be numbers or numeric strings (form fields are always text).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReviewPayload {
    #[serde(rename = "_id", alias = "id")]
    pub id: Option<String>,

    /// Marks the identified review for deletion on update.
    #[serde(deserialize_with = "loose_bool")]
    pub delete: bool,

    pub user: Option<String>,
    pub username: Option<String>,
    pub photo: Option<String>,
    pub userphoto: Option<String>,
    pub review: Option<String>,

    #[serde(deserialize_with = "loose_int")]
    pub rating: Option<i32>,

    pub date: Option<String>,

    /// Index into the uploaded `reviewImages[<idx>]` files; defaults to the
    /// review's own position.
    #[serde(rename = "photoIndex", deserialize_with = "loose_index")]
    pub photo_index: Option<usize>,
}

impl ReviewPayload {
    /// Display name: `username` wins over `user`.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.user.clone())
            .unwrap_or_default()
    }

    /// Photo for a freshly-created review: `userphoto` wins over `photo`.
    #[must_use]
    pub fn fallback_photo(&self) -> Option<String> {
        self.userphoto.clone().or_else(|| self.photo.clone())
    }

    /// Photo for an updated review: the stored `photo` wins over `userphoto`.
    #[must_use]
    pub fn stored_photo(&self) -> Option<String> {
        self.photo.clone().or_else(|| self.userphoto.clone())
    }
}

/// Rating patch carried alongside scalar property fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RatingPatch {
    pub average: Option<f64>,
    pub count: Option<i32>,
}

/// Structural detail patch; `None` fields are left untouched on update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetailsPatch {
    pub bedrooms: Option<i32>,
    pub beds: Option<i32>,
    pub bathrooms: Option<i32>,
    pub max_guests: Option<i32>,
}

impl DetailsPatch {
    /// Read the details group from a nested `details` object or from
    /// dot-notation fields (`details.bedrooms`), whichever is present.
    fn from_map(map: &Map<String, Value>) -> Self {
        let nested = map.get("details").and_then(Value::as_object);
        let field = |name: &str, dotted: &str| {
            nested
                .and_then(|details| details.get(name))
                .or_else(|| map.get(dotted))
                .and_then(int_value)
        };

        Self {
            bedrooms: field("bedrooms", "details.bedrooms"),
            beds: field("beds", "details.beds"),
            bathrooms: field("bathrooms", "details.bathrooms"),
            max_guests: field("maxGuests", "details.maxGuests"),
        }
    }
}

/// Filenames assigned by the image store to this request's uploads.
#[derive(Debug, Clone, Default)]
pub struct UploadSet {
    /// Files uploaded under the `images` field, in arrival order.
    pub images: Vec<String>,
    /// Files uploaded under `reviewImages[<idx>]`, keyed by index.
    pub review_images: BTreeMap<usize, String>,
    /// File uploaded under the standalone review `photo` field.
    pub photo: Option<String>,
}

/// The normalized property create/update request.
///
/// `None` means the field was absent from the request: creates substitute
/// defaults, updates leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyPayload {
    pub title: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub details: DetailsPatch,
    pub features: Option<Vec<Feature>>,
    pub amenities: Option<Vec<Amenity>>,
    pub reviews: Option<Vec<ReviewPayload>>,
    /// Stored filenames the client wants to keep, on update.
    pub existing_images: Option<Vec<String>>,
    /// Filenames passed as a body field rather than as uploads.
    pub images: Option<Vec<String>>,
    pub rating: Option<RatingPatch>,
}

impl PropertyPayload {
    /// Normalize a request-body map (JSON object or collected form fields).
    #[must_use]
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            title: string_field(map, "title"),
            address: string_field(map, "address"),
            description: string_field(map, "description"),
            details: DetailsPatch::from_map(map),
            features: features_from_map(map),
            amenities: amenities_from_map(map),
            reviews: reviews_from_map(map),
            existing_images: map.get("existingImages").map(retained_image_list),
            images: map.get("images").map(body_image_list),
            rating: map
                .get("rating")
                .and_then(|value| serde_json::from_value(value.clone()).ok()),
        }
    }
}

/// Stored filenames absent from the next image set, order-independent.
#[must_use]
pub fn stale_images(current: &[String], next: &[String]) -> Vec<String> {
    current
        .iter()
        .filter(|image| !next.contains(image))
        .cloned()
        .collect()
}

/// Read a JSON array column of filenames back into a list.
#[must_use]
pub fn image_filenames(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

// === Field readers ===

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn int_value(value: &Value) -> Option<i32> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|f| f as i64))
            .and_then(|n| i32::try_from(n).ok()),
        Value::String(text) => text.trim().parse::<i32>().ok(),
        _ => None,
    }
}

fn bracket_value(map: &Map<String, Value>, field: &str, idx: usize, sub: &str) -> Option<String> {
    map.get(&format!("{field}[{idx}][{sub}]"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

// === Amenities ===

fn amenities_from_map(map: &Map<String, Value>) -> Option<Vec<Amenity>> {
    if let Some(value) = map.get("amenities") {
        return Some(amenities_from_value(value));
    }
    bracket_amenities(map)
}

/// Normalize the `amenities` field from its array or JSON-string shape.
fn amenities_from_value(value: &Value) -> Vec<Amenity> {
    match value {
        Value::Array(items) => items.iter().map(amenity_item).collect(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => items.iter().map(amenity_item).collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn amenity_item(item: &Value) -> Amenity {
    match item {
        Value::String(text) => serde_json::from_str(text).unwrap_or_else(|_| Amenity {
            name: text.clone(),
            icon: DEFAULT_ICON.to_string(),
        }),
        _ => serde_json::from_value(item.clone()).unwrap_or_default(),
    }
}

fn bracket_amenities(map: &Map<String, Value>) -> Option<Vec<Amenity>> {
    let mut amenities = Vec::new();

    for idx in 0.. {
        let name = bracket_value(map, "amenities", idx, "name");
        let icon = bracket_value(map, "amenities", idx, "icon");
        if name.is_none() && icon.is_none() {
            break;
        }
        amenities.push(Amenity {
            name: name.unwrap_or_default(),
            icon: icon
                .filter(|icon| !icon.is_empty())
                .unwrap_or_else(|| DEFAULT_ICON.to_string()),
        });
    }

    if amenities.is_empty() { None } else { Some(amenities) }
}

// === Features ===

fn features_from_map(map: &Map<String, Value>) -> Option<Vec<Feature>> {
    if let Some(value) = map.get("features") {
        return Some(features_from_value(value));
    }
    bracket_features(map)
}

fn features_from_value(value: &Value) -> Vec<Feature> {
    match value {
        Value::Array(items) => items.iter().map(feature_item).collect(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => items.iter().map(feature_item).collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn feature_item(item: &Value) -> Feature {
    match item {
        Value::String(text) => serde_json::from_str(text).unwrap_or_else(|_| Feature {
            name: text.clone(),
            ..Feature::default()
        }),
        _ => serde_json::from_value(item.clone()).unwrap_or_default(),
    }
}

fn bracket_features(map: &Map<String, Value>) -> Option<Vec<Feature>> {
    let mut features = Vec::new();

    for idx in 0.. {
        let name = bracket_value(map, "features", idx, "name");
        let description = bracket_value(map, "features", idx, "description");
        let icon = bracket_value(map, "features", idx, "icon");
        if name.is_none() && description.is_none() && icon.is_none() {
            break;
        }
        features.push(Feature {
            name: name.unwrap_or_default(),
            description: description.unwrap_or_default(),
            icon: icon
                .filter(|icon| !icon.is_empty())
                .unwrap_or_else(|| DEFAULT_ICON.to_string()),
        });
    }

    if features.is_empty() { None } else { Some(features) }
}

// === Reviews ===

const REVIEW_SUBKEYS: &[&str] = &[
    "_id",
    "id",
    "delete",
    "user",
    "username",
    "photo",
    "userphoto",
    "review",
    "rating",
    "date",
    "photoIndex",
];

fn reviews_from_map(map: &Map<String, Value>) -> Option<Vec<ReviewPayload>> {
    if let Some(value) = map.get("reviews") {
        return Some(reviews_from_value(value));
    }
    bracket_reviews(map)
}

/// Normalize the `reviews` field from its array or JSON-string shape.
fn reviews_from_value(value: &Value) -> Vec<ReviewPayload> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(parsed @ Value::Array(_)) => reviews_from_value(&parsed),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn bracket_reviews(map: &Map<String, Value>) -> Option<Vec<ReviewPayload>> {
    let mut reviews = Vec::new();

    for idx in 0.. {
        let mut object = Map::new();
        for subkey in REVIEW_SUBKEYS {
            if let Some(value) = map.get(&format!("reviews[{idx}][{subkey}]")) {
                object.insert((*subkey).to_string(), value.clone());
            }
        }
        if object.is_empty() {
            break;
        }
        if let Ok(review) = serde_json::from_value(Value::Object(object)) {
            reviews.push(review);
        }
    }

    if reviews.is_empty() { None } else { Some(reviews) }
}

// === Image lists ===

/// `existingImages`: a JSON-string or array of retained filenames; parse
/// failure falls back to the empty list.
fn retained_image_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(_) => image_filenames(value),
        Value::String(text) => serde_json::from_str(text).unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// `images` as a body field: an array, a JSON-string, or a bare filename.
fn body_image_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(_) => image_filenames(value),
        Value::String(text) => {
            serde_json::from_str(text).unwrap_or_else(|_| vec![text.clone()])
        }
        _ => Vec::new(),
    }
}

// === Loose scalar parsers (form fields are always text) ===

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseBool {
    Flag(bool),
    Text(String),
}

fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Option::<LooseBool>::deserialize(deserializer)? {
        Some(LooseBool::Flag(flag)) => Ok(flag),
        Some(LooseBool::Text(text)) => Ok(text == "true" || text == "1"),
        None => Ok(false),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

impl LooseNumber {
    fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            #[allow(clippy::cast_possible_truncation)]
            Self::Float(f) => Some(*f as i64),
            Self::Text(text) => text.trim().parse::<i64>().ok(),
        }
    }
}

pub(crate) fn loose_int<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i32>, D::Error> {
    let number = Option::<LooseNumber>::deserialize(deserializer)?;
    Ok(number
        .and_then(|n| n.as_i64())
        .and_then(|n| i32::try_from(n).ok()))
}

fn loose_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
    let number = Option::<LooseNumber>::deserialize(deserializer)?;
    Ok(number
        .and_then(|n| n.as_i64())
        .and_then(|n| usize::try_from(n).ok()))
}
