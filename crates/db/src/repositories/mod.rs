//! Repositories for database access.

mod property;
mod review;
mod user;

pub use property::{PropertyRepository, ReviewWrite};
pub use review::ReviewRepository;
pub use user::UserRepository;
