//! Core business logic for haven.

pub mod ingest;
pub mod query;
pub mod services;

pub use ingest::{
    Amenity, Feature, PropertyPayload, ReviewPayload, UploadSet, image_filenames, stale_images,
};
pub use query::ListQuery;
pub use services::*;
