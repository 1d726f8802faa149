//! User and authentication endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use haven_common::{AppError, AppResult, config::AuthConfig, sign_token};
use haven_core::CreateUserInput;
use haven_db::entities::user::Model as UserModel;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    extractors::{MaybeAuthUser, MaybeSessionToken},
    middleware::AppState,
    response::ApiResponse,
};

/// User response body; the password hash never leaves the service.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

impl From<UserModel> for UserResponse {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            email: model.email,
            role: model.role,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
struct UserData {
    user: UserResponse,
}

/// Create a user account.
async fn signup(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<ApiResponse<UserData>> {
    let input = parse_input(body, "Failed to create user.")?;
    let user = state
        .user_service
        .create(input)
        .await
        .map_err(|e| prefix_client_error("Failed to create user.", e))?;

    Ok(ApiResponse::created(
        "User created successfully.",
        UserData { user: user.into() },
    ))
}

/// Create an admin account; the body must carry the `admin` role.
///
/// On success the session artifact is issued immediately, like login.
async fn create_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<Value>,
) -> AppResult<(CookieJar, ApiResponse<UserData>)> {
    let input = parse_input(body, "Failed to create admin.")?;
    if input.role.as_deref() != Some("admin") {
        return Err(AppError::BadRequest(
            "Only admin role is allowed for this action.".to_string(),
        ));
    }

    let user = state
        .user_service
        .create(input)
        .await
        .map_err(|e| prefix_client_error("Failed to create admin.", e))?;

    let token = sign_token(&user.id, &state.auth.jwt_secret, state.auth.token_valid_days)?;
    let jar = jar.add(session_cookie(&state.auth, token.clone()));

    Ok((
        jar,
        ApiResponse::created("Admin created successfully.", UserData { user: user.into() })
            .with_token(token),
    ))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Log in with email and password.
///
/// The session token is both set as the `jwt` cookie and returned in the
/// body, so clients may consume it either way. Unknown email and wrong
/// password answer identically.
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> AppResult<(CookieJar, ApiResponse<UserData>)> {
    let (Some(email), Some(password)) = (
        req.email.filter(|email| !email.is_empty()),
        req.password.filter(|password| !password.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Please provide both email and password.".to_string(),
        ));
    };

    let user = state.user_service.authenticate(&email, &password).await?;

    let token = sign_token(&user.id, &state.auth.jwt_secret, state.auth.token_valid_days)?;
    let jar = jar.add(session_cookie(&state.auth, token.clone()));

    Ok((
        jar,
        ApiResponse::ok("Logged in successfully.", UserData { user: user.into() })
            .with_token(token),
    ))
}

/// Log out: clear the session cookie.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, ApiResponse<Value>) {
    let jar = jar.remove(session_cookie(&state.auth, String::new()));

    (
        jar,
        ApiResponse::ok("You have been logged out.", Value::Null),
    )
}

/// Echo the authenticated user and token.
async fn check_auth(
    MaybeAuthUser(user): MaybeAuthUser,
    MaybeSessionToken(token): MaybeSessionToken,
) -> AppResult<ApiResponse<UserData>> {
    let user = user.ok_or_else(|| {
        AppError::Unauthorized("Authentication failed. User does not exist.".to_string())
    })?;

    let mut response =
        ApiResponse::ok("User authenticated successfully.", UserData { user: user.into() });
    if let Some(token) = token {
        response = response.with_token(token);
    }

    Ok(response)
}

/// Build the `jwt` session cookie with the configured attributes.
fn session_cookie(auth: &AuthConfig, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new("jwt", token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(auth.cookie_secure);
    cookie.set_same_site(SameSite::None);
    if let Some(domain) = auth.cookie_domain.clone() {
        cookie.set_domain(domain);
    }
    cookie
}

fn parse_input(body: Value, prefix: &str) -> AppResult<CreateUserInput> {
    serde_json::from_value(body).map_err(|e| AppError::BadRequest(format!("{prefix} {e}")))
}

/// Prefix client-caused failures the way each action reports them; server
/// errors pass through untouched.
fn prefix_client_error(prefix: &str, err: AppError) -> AppError {
    match err {
        AppError::BadRequest(message) => AppError::BadRequest(format!("{prefix} {message}")),
        AppError::Validation(message) => AppError::BadRequest(format!("{prefix} {message}")),
        other => other,
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/create-admin", post(create_admin))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/check-auth", get(check_auth))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header::CONTENT_TYPE};
    use chrono::Utc;
    use haven_common::ImageStore;
    use haven_core::{PropertyService, ReviewService, UserService};
    use haven_db::entities::user;
    use haven_db::repositories::{PropertyRepository, ReviewRepository, UserRepository};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state(db: Arc<DatabaseConnection>, dir: &std::path::Path) -> AppState {
        let store = ImageStore::new(dir);
        AppState {
            property_service: PropertyService::new(
                PropertyRepository::new(Arc::clone(&db)),
                ReviewRepository::new(Arc::clone(&db)),
                store.clone(),
            ),
            review_service: ReviewService::new(
                ReviewRepository::new(Arc::clone(&db)),
                PropertyRepository::new(Arc::clone(&db)),
                store.clone(),
            ),
            user_service: UserService::new(UserRepository::new(db)),
            store,
            auth: AuthConfig {
                jwt_secret: "test-secret".to_string(),
                token_valid_days: 7,
                cookie_domain: None,
                cookie_secure: true,
            },
        }
    }

    fn login_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn stored_user() -> user::Model {
        user::Model {
            id: "user1".to_string(),
            email: "ada@example.com".to_string(),
            // Not a parseable argon2 hash, so any password fails to verify.
            password: "stub".to_string(),
            role: "admin".to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_login_unknown_email_and_wrong_password_are_identical() {
        let dir = tempfile::tempdir().unwrap();

        // Unknown email: the user lookup comes back empty.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );
        let app = router().with_state(test_state(db, dir.path()));
        let unknown = app
            .oneshot(login_request(
                r#"{"email":"ghost@example.com","password":"whatever"}"#,
            ))
            .await
            .unwrap();

        // Wrong password: the user exists but verification fails.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored_user()]])
                .into_connection(),
        );
        let app = router().with_state(test_state(db, dir.path()));
        let wrong = app
            .oneshot(login_request(
                r#"{"email":"ada@example.com","password":"wrong"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        let unknown_body = body_json(unknown).await;
        let wrong_body = body_json(wrong).await;
        assert_eq!(unknown_body, wrong_body);
        assert_eq!(unknown_body["status"], "fail");
        assert_eq!(
            unknown_body["error"],
            "Login failed. Please check your credentials."
        );
    }

    #[tokio::test]
    async fn test_login_requires_both_fields() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let app = router().with_state(test_state(db, dir.path()));

        let response = app
            .oneshot(login_request(r#"{"email":"ada@example.com"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Please provide both email and password.");
    }

    #[tokio::test]
    async fn test_create_admin_rejects_other_roles() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let app = router().with_state(test_state(db, dir.path()));

        let request = Request::builder()
            .method("POST")
            .uri("/create-admin")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"email":"new@example.com","password":"long enough","role":"user"}"#,
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Only admin role is allowed for this action.");
    }

    #[tokio::test]
    async fn test_check_auth_without_session_is_unauthorized() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let app = router().with_state(test_state(db, dir.path()));

        let request = Request::builder()
            .method("GET")
            .uri("/check-auth")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Authentication failed. User does not exist.");
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let app = router().with_state(test_state(db, dir.path()));

        let request = Request::builder()
            .method("POST")
            .uri("/logout")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("jwt="));

        let body = body_json(response).await;
        assert_eq!(body["message"], "You have been logged out.");
    }
}
