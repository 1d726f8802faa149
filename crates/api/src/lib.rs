//! HTTP API layer for haven.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: property, review, and user/auth routes under `/api/v1`
//! - **Extractors**: authenticated-user extraction from request extensions
//! - **Middleware**: session-token verification from cookie or bearer header
//! - **Multipart**: form collection that stores image uploads as they stream
//!
//! Built on Axum 0.8 with the Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod multipart;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
pub use response::ApiResponse;
