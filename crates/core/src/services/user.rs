//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use haven_common::{AppError, AppResult, IdGenerator};
use haven_db::{entities::user, repositories::UserRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for creating a new user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    /// `admin` or `user`; defaults to `user`.
    #[serde(default)]
    pub role: Option<String>,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(users: UserRepository) -> Self {
        Self {
            users,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new user with a hashed password.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::BadRequest("Email already in use.".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(input.email),
            password: Set(password_hash),
            role: Set(input.role.unwrap_or_else(|| "user".to_string())),
            created_at: Set(Utc::now().into()),
        };

        self.users.create(model).await
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.users.get_by_id(id).await
    }

    /// Authenticate a user by email and password.
    ///
    /// Unknown email and wrong password return the identical error, so the
    /// response never confirms whether an account exists.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password) {
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }
}

/// Hash a password with argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash.
///
/// An unparseable stored hash verifies as false rather than erroring, so
/// the login response stays uniform.
fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
