use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use sea_orm::entity::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use service::books::repository::{BookUpdate, NewBook};

use super::auth::{CurrentUser, ServerState};
use crate::errors::ApiError;

// The client speaks camelCase for the two fields the original web UI named
// that way; everything else stays snake_case.
#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    #[serde(rename = "bookPages")]
    pub book_pages: Option<i32>,
    #[serde(rename = "publishDate")]
    pub publish_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    #[serde(rename = "bookPages")]
    pub book_pages: Option<i32>,
    #[serde(rename = "publishDate")]
    pub publish_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    #[serde(alias = "currentPage")]
    pub current_page: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub rating: Option<i16>,
}

/// Book as the API returns it: stored columns plus the derived reading
/// status and progress percentage.
#[derive(Serialize)]
pub struct BookResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub author: String,
    #[serde(rename = "bookPages")]
    pub no_of_pages: i32,
    #[serde(rename = "publishDate")]
    pub published_at: NaiveDate,
    pub current_page: i32,
    pub rating: Option<i16>,
    pub status: String,
    pub progress: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl From<models::book::Model> for BookResponse {
    fn from(b: models::book::Model) -> Self {
        let status = b.reading_status().to_string();
        let progress = b.progress_percent();
        Self {
            id: b.id,
            user_id: b.user_id,
            title: b.title,
            author: b.author,
            no_of_pages: b.no_of_pages,
            published_at: b.published_at,
            current_page: b.current_page,
            rating: b.rating,
            status,
            progress,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct BookMessageResponse {
    pub message: String,
    pub book: BookResponse,
}

fn parse_publish_date(raw: &str) -> Result<NaiveDate, ApiError> {
    raw.parse::<NaiveDate>()
        .map_err(|_| ApiError::Validation("publishDate must be an ISO date (YYYY-MM-DD)".into()))
}

fn require_fields(
    title: Option<String>,
    author: Option<String>,
    book_pages: Option<i32>,
    publish_date: Option<String>,
) -> Result<(String, String, i32, NaiveDate), ApiError> {
    let (Some(title), Some(author), Some(pages), Some(date)) =
        (title, author, book_pages, publish_date)
    else {
        return Err(ApiError::Validation(
            "title, author, bookPages and publishDate are required".into(),
        ));
    };
    Ok((title, author, pages, parse_publish_date(&date)?))
}

#[utoipa::path(get, path = "/api/books", tag = "books", responses((status = 200, description = "Books owned by the caller")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = state.books.list(user.id).await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

#[utoipa::path(post, path = "/api/books/addBook", tag = "books", request_body = crate::openapi::BookInput, responses((status = 201, description = "Created"), (status = 400, description = "Invalid input")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(input): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookMessageResponse>), ApiError> {
    let (title, author, no_of_pages, published_at) =
        require_fields(input.title, input.author, input.book_pages, input.publish_date)?;
    let created = state
        .books
        .create(user.id, NewBook { title, author, no_of_pages, published_at })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(BookMessageResponse { message: "book added".into(), book: created.into() }),
    ))
}

#[utoipa::path(get, path = "/api/books/editBook/{id}", tag = "books", params(("id" = Uuid, Path, description = "Book id")), responses((status = 200, description = "Book"), (status = 404, description = "Not found")))]
pub async fn get_one(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = state.books.get(user.id, id).await?;
    Ok(Json(book.into()))
}

#[utoipa::path(put, path = "/api/books/editBook/{id}", tag = "books", params(("id" = Uuid, Path, description = "Book id")), request_body = crate::openapi::BookInput, responses((status = 200, description = "Updated"), (status = 400, description = "Invalid input"), (status = 404, description = "Not found")))]
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateBookRequest>,
) -> Result<Json<BookMessageResponse>, ApiError> {
    let (title, author, no_of_pages, published_at) =
        require_fields(input.title, input.author, input.book_pages, input.publish_date)?;
    let updated = state
        .books
        .update(user.id, id, BookUpdate { title, author, no_of_pages, published_at })
        .await?;
    Ok(Json(BookMessageResponse { message: "book updated".into(), book: updated.into() }))
}

#[utoipa::path(delete, path = "/api/books/{id}", tag = "books", params(("id" = Uuid, Path, description = "Book id")), responses((status = 200, description = "Deleted"), (status = 404, description = "Not found")))]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookMessageResponse>, ApiError> {
    let deleted = state.books.delete(user.id, id).await?;
    Ok(Json(BookMessageResponse { message: "book deleted".into(), book: deleted.into() }))
}

#[utoipa::path(patch, path = "/api/books/{id}/progress", tag = "books", params(("id" = Uuid, Path, description = "Book id")), request_body = crate::openapi::ProgressInput, responses((status = 200, description = "Progress updated"), (status = 400, description = "Page out of range"), (status = 404, description = "Not found")))]
pub async fn update_progress(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<ProgressRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let Some(current_page) = input.current_page else {
        return Err(ApiError::Validation("current_page is required".into()));
    };
    let updated = state.books.update_progress(user.id, id, current_page).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(patch, path = "/api/books/{id}/rating", tag = "books", params(("id" = Uuid, Path, description = "Book id")), request_body = crate::openapi::RatingInput, responses((status = 200, description = "Rating updated"), (status = 400, description = "Rating out of range"), (status = 404, description = "Not found")))]
pub async fn update_rating(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<RatingRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let Some(rating) = input.rating else {
        return Err(ApiError::Validation("rating is required".into()));
    };
    let updated = state.books.update_rating(user.id, id, rating).await?;
    Ok(Json(updated.into()))
}
