//! Common utilities and shared types for haven.
//!
//! This crate provides foundational components used across all haven crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Session tokens**: JWT signing and verification for the `jwt` cookie
//! - **Storage**: Filesystem image storage under the public directory
//!
//! # Example
//!
//! ```no_run
//! use haven_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {id}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod storage;
pub mod token;

pub use config::{AuthConfig, Config, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{ImageFolder, ImageStore};
pub use token::{Claims, sign_token, verify_token};
