//! Business logic services.

pub mod property;
pub mod review;
pub mod user;

pub use property::PropertyService;
pub use review::{CreateReviewInput, ReviewService};
pub use user::{CreateUserInput, UserService};
