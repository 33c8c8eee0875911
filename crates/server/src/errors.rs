use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, warn};

use service::auth::errors::AuthError;
use service::errors::ServiceError;

/// HTTP-facing error. Every variant carries a message safe to show clients;
/// internals are logged and replaced with a generic body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            // Duplicates surface as a plain 400 on this API
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref e) = self {
            error!(error = %e, "internal error");
        }
        let status = self.status();
        (status, Json(serde_json::json!({ "message": self.to_string() }))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => ApiError::Validation(msg),
            AuthError::Conflict => ApiError::Conflict("username or email already exists".into()),
            AuthError::NotFound => ApiError::NotFound("user not found".into()),
            AuthError::Unauthorized => ApiError::Unauthenticated("invalid credentials".into()),
            AuthError::InvalidToken(reason) => {
                // The concrete reason stays in the logs; clients all read
                // the same message.
                warn!(code = AuthError::InvalidToken(reason).code(), %reason, "token rejected");
                ApiError::Forbidden("invalid or expired token".into())
            }
            AuthError::HashError(msg) | AuthError::TokenError(msg) | AuthError::Repository(msg) => {
                ApiError::Internal(anyhow::anyhow!(msg))
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) => ApiError::Validation(msg),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Db(msg) => ApiError::Internal(anyhow::anyhow!(msg)),
            ServiceError::Model(e) => ApiError::Internal(anyhow::anyhow!(e)),
        }
    }
}
