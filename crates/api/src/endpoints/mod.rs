//! API endpoints.

mod properties;
mod reviews;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/property", properties::router())
        .nest("/review", reviews::router())
        .nest("/user", users::router())
}
