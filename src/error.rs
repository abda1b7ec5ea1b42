use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            // The original surface uses 403 for both missing and bad tokens.
            AppError::Unauthenticated => (StatusCode::FORBIDDEN, "You are not authenticated".into()),
            AppError::InvalidToken => (StatusCode::FORBIDDEN, "Invalid or expired token".into()),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials".into()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::UnsupportedMediaType(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg.clone()),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            AppError::Database(e) => {
                // MySQL 1062 is a duplicate key; other SQLSTATE 23000
                // violations (foreign keys etc.) stay server errors.
                let duplicate = e
                    .as_database_error()
                    .and_then(|d| d.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>())
                    .map(|m| m.number() == 1062)
                    .unwrap_or(false);
                if duplicate {
                    return (
                        StatusCode::CONFLICT,
                        Json(json!({ "error": "Resource already exists (duplicate entry)" })),
                    )
                        .into_response();
                }
                error!(error = %e, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
            AppError::Internal(e) => {
                error!(error = %e, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let resp = AppError::Validation("missing field".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_and_bad_tokens_both_map_to_403() {
        assert_eq!(
            AppError::Unauthenticated.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::InvalidToken.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn non_duplicate_database_errors_map_to_500() {
        let resp = AppError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn conflict_maps_to_409() {
        let resp = AppError::Conflict("Email already exists.".into()).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
