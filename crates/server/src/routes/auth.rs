use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use service::auth::domain::{AuthUser, LoginInput, RegisterInput};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::books::repository::SeaOrmBookRepository;
use service::books::BookService;

use crate::errors::ApiError;

/// Shared application state: one service instance per domain, each wired to
/// the same connection pool.
#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService<SeaOrmAuthRepository>>,
    pub books: Arc<BookService<SeaOrmBookRepository>>,
}

impl ServerState {
    pub fn new(db: DatabaseConnection, cfg: AuthConfig) -> Self {
        let auth_repo = Arc::new(SeaOrmAuthRepository { db: db.clone() });
        let book_repo = Arc::new(SeaOrmBookRepository { db });
        Self {
            auth: Arc::new(AuthService::new(auth_repo, cfg)),
            books: Arc::new(BookService::new(book_repo)),
        }
    }
}

/// Identity resolved by the bearer middleware and injected into request
/// extensions for protected handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

// Required fields arrive as Options so a missing key answers 400 with a
// readable message instead of a serde rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: AuthUser,
    pub token: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user: AuthUser,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[utoipa::path(post, path = "/api/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 201, description = "Registered"), (status = 400, description = "Invalid input or duplicate username/email")))]
pub async fn register(
    State(state): State<ServerState>,
    Json(input): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (Some(username), Some(email), Some(password)) =
        (input.username, input.email, input.password)
    else {
        return Err(ApiError::Validation("username, email and password are required".into()));
    };
    let session = state.auth.register(RegisterInput { username, email, password }).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "user registered".into(),
            user: session.user,
            token: session.token,
        }),
    ))
}

#[utoipa::path(post, path = "/api/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in"), (status = 401, description = "Invalid credentials")))]
pub async fn login(
    State(state): State<ServerState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (Some(email), Some(password)) = (input.email, input.password) else {
        return Err(ApiError::Validation("email and password are required".into()));
    };
    let session = state.auth.login(LoginInput { email, password }).await?;
    Ok(Json(AuthResponse {
        message: "login successful".into(),
        user: session.user,
        token: session.token,
    }))
}

/// Fresh lookup so a deleted account stops resolving even while its token
/// is still within TTL.
#[utoipa::path(get, path = "/api/auth/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Missing token"), (status = 403, description = "Invalid or expired token")))]
pub async fn me(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<UserResponse>, ApiError> {
    let profile = state.auth.profile(user.id).await?;
    Ok(Json(UserResponse { user: profile }))
}

/// Tokens are stateless; logout is an acknowledgement and the client
/// discards its copy.
#[utoipa::path(post, path = "/api/auth/logout", tag = "auth", responses((status = 200, description = "Logged out")))]
pub async fn logout(Extension(user): Extension<CurrentUser>) -> Json<MessageResponse> {
    tracing::info!(user_id = %user.id, "user_logged_out");
    Json(MessageResponse { message: "logged out".into() })
}

/// Guard for protected routes: missing token answers 401, a token that
/// fails verification answers 403. On success the resolved identity is
/// placed in request extensions.
pub async fn require_bearer_token(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let Some(token) = header.and_then(|h| h.strip_prefix("Bearer ")) else {
        tracing::warn!(path = %req.uri().path(), "missing bearer token");
        return Err(ApiError::Unauthenticated("access token required".into()));
    };
    let claims = state.auth.verify_token(token)?;
    req.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        username: claims.username,
        email: claims.email,
    });
    Ok(next.run(req).await)
}
