use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{0} {1} not found")]
    NotFound(&'static str, Uuid),

    #[error("not allowed")]
    Unauthorized,

    #[error("authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Conflict(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("store error: {0}")]
    Store(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type MarketResult<T> = Result<T, MarketError>;

impl MarketError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<JsonRejection> for MarketError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!(error = %rejection, "rejected request body");
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for MarketError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::warn!(error = %rejection, "rejected query string");
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for MarketError {
    fn from(rejection: PathRejection) -> Self {
        tracing::warn!(error = %rejection, "rejected path parameter");
        Self::Validation(rejection.body_text())
    }
}

impl From<anyhow::Error> for MarketError {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(format!("{e:#}"))
    }
}

impl From<sqlx::Error> for MarketError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            // unique_violation
            if db.code().as_deref() == Some("23505") {
                return Self::Conflict("email already in use".into());
            }
        }
        Self::Store(e.to_string())
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            MarketError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            MarketError::NotFound(..) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            MarketError::Unauthorized => (
                StatusCode::FORBIDDEN,
                "unauthorized",
                "You are not allowed to perform this action".to_string(),
            ),
            MarketError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "Authentication required".to_string(),
            ),
            MarketError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            MarketError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid credentials".to_string(),
            ),
            MarketError::Store(msg) => {
                tracing::error!(error = %msg, "store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            MarketError::Upload(msg) => {
                tracing::error!(error = %msg, "upload failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "upload_error",
                    "Image upload failed".to_string(),
                )
            }
            MarketError::Internal(msg) => {
                tracing::error!(error = %msg, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({
                "error": {
                    "type": error_type,
                    "message": message
                }
            })),
        )
            .into_response()
    }
}
