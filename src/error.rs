use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Order not found")]
    OrderNotFound,

    #[error("Zone not found")]
    ZoneNotFound,

    #[error("Courier not found")]
    CourierNotFound,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

// Convert AppError to an HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            AppError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Validation failed".to_string(),
                errors.clone(),
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".into(),
                Vec::new(),
            ),
            AppError::OrderNotFound | AppError::ZoneNotFound | AppError::CourierNotFound => {
                (StatusCode::NOT_FOUND, self.to_string(), Vec::new())
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string(), Vec::new()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
                Vec::new(),
            ),
            AppError::Json(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "JSON error".into(),
                Vec::new(),
            ),
        };

        tracing::error!(?self);
        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

pub type Result<T> = std::result::Result<T, AppError>;
