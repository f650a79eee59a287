use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use database::DbError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("Analytics error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),
    #[error("Validation error: {0}")]
    Validation(#[from] core_types::CoreError),
    #[error("Invalid request body: {0}")]
    Body(#[from] JsonRejection),
    #[error("Invalid path: {0}")]
    Path(#[from] PathRejection),
    #[error("Invalid query: {0}")]
    Query(#[from] QueryRejection),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(DbError::NotFound) => {
                (StatusCode::NOT_FOUND, "Trade not found".to_string())
            }
            AppError::Database(DbError::Validation(err)) | AppError::Validation(err) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            // Malformed input is a client error regardless of axum's own status.
            AppError::Body(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            AppError::Path(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            AppError::Query(rejection) => (StatusCode::BAD_REQUEST, rejection.body_text()),
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::Analytics(analytics_err) => {
                tracing::error!(error = ?analytics_err, "Analytics error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An error occurred while exporting trades".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
