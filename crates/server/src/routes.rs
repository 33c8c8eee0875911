use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::openapi::ApiDoc;

pub mod auth;
pub mod books;

pub use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service healthy")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "book tracker api is running" }))
}

/// Build the full application router: public banner/health and auth entry
/// points, plus the bearer-protected API surface.
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    // Public routes: no token required
    let public = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    // Protected routes: identity resolved by the bearer middleware
    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/books", get(books::list))
        .route("/api/books/addBook", post(books::create))
        .route("/api/books/editBook/:id", get(books::get_one).put(books::update))
        .route("/api/books/:id", delete(books::delete))
        .route("/api/books/:id/progress", patch(books::update_progress))
        .route("/api/books/:id/rating", patch(books::update_rating))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_token,
        ));

    // Compose
    public
        .merge(protected)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
