use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, serde::Serialize)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    #[serde(rename = "bookPages")]
    pub book_pages: i32,
    #[serde(rename = "publishDate")]
    pub publish_date: String,
}

#[derive(ToSchema)]
pub struct ProgressInput {
    pub current_page: i32,
}

#[derive(ToSchema)]
pub struct RatingInput {
    pub rating: i16,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::me,
        crate::routes::auth::logout,
        crate::routes::books::list,
        crate::routes::books::create,
        crate::routes::books::get_one,
        crate::routes::books::update,
        crate::routes::books::delete,
        crate::routes::books::update_progress,
        crate::routes::books::update_rating,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            BookInput,
            ProgressInput,
            RatingInput,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "books")
    )
)]
pub struct ApiDoc;
