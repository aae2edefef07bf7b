use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// An authorization error.
    #[error("Authorization failed")]
    Unauthorized,

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// A presented token that matches no active session or is past expiry.
    /// The two cases are deliberately indistinguishable to the caller.
    #[error("Invalid or expired attendance code")]
    InvalidOrExpiredToken,

    /// The student is not enrolled in the class owning the lesson.
    #[error("Not enrolled in this class")]
    NotEnrolled,

    /// Attendance already recorded for this student and lesson.
    #[error("Attendance already recorded")]
    DuplicateAttendance,

    /// A validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable".to_string())
            }

            AppError::Pool(ref e) => {
                tracing::error!("Connection pool error: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable".to_string())
            }

            AppError::Unauthorized => {
                tracing::warn!("Authorization failed");
                (StatusCode::FORBIDDEN, "Forbidden".to_string())
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }

            AppError::InvalidOrExpiredToken => {
                tracing::debug!("Rejected attendance token");
                (
                    StatusCode::NOT_FOUND,
                    "Invalid or expired attendance code".to_string(),
                )
            }

            AppError::NotEnrolled => {
                tracing::warn!("Scan from a student not enrolled in the class");
                (
                    StatusCode::FORBIDDEN,
                    "You are not enrolled in this class".to_string(),
                )
            }

            AppError::DuplicateAttendance => {
                tracing::debug!("Duplicate attendance scan");
                (
                    StatusCode::BAD_REQUEST,
                    "You have already recorded attendance for this lesson".to_string(),
                )
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, body).into_response()
    }
}
