//! Error types for Bookshelf server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::message::FlashMessage;

/// Stable error codes exposed in JSON error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchBook = 5,
    Duplicate = 7,
    ConstraintViolation = 8,
    BadValue = 9,
    NoSelection = 10,
    NothingToReturn = 11,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    /// A book with this ISBN is already registered (carries the submitted title)
    #[error("\"{0}\" is already registered")]
    DuplicateIsbn(String),

    /// The database rejected an insert or update on a uniqueness constraint
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("No books selected")]
    NoSelection,

    #[error("Nothing to return")]
    NothingToReturn,
}

impl AppError {
    /// Translate a failed write into `ConstraintViolation` when the database
    /// reports a unique violation, keeping every other error as is.
    pub fn from_write(err: sqlx::Error, what: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                let constraint = db.constraint().unwrap_or("unique").to_string();
                AppError::ConstraintViolation(format!("{} rejected by {}", what, constraint))
            }
            _ => AppError::Database(err),
        }
    }

    /// User-facing message for errors that end a form submission without
    /// failing the request. `None` means the error must propagate.
    pub fn notice(&self) -> Option<FlashMessage> {
        match self {
            AppError::DuplicateIsbn(title) => {
                Some(FlashMessage::info(format!("\"{}\" is already registered.", title)))
            }
            AppError::ConstraintViolation(_) => {
                Some(FlashMessage::warning("The change was rejected by a concurrent update."))
            }
            AppError::NoSelection => Some(FlashMessage::info("No books selected.")),
            AppError::NothingToReturn => Some(FlashMessage::info("Nothing to return.")),
            AppError::Validation(msg) | AppError::BadRequest(msg) => {
                Some(FlashMessage::error(msg.clone()))
            }
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid value for {}", field),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join(" "))
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchBook, msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone())
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::DuplicateIsbn(_) => {
                (StatusCode::CONFLICT, ErrorCode::Duplicate, self.to_string())
            }
            AppError::ConstraintViolation(msg) => {
                tracing::warn!("Constraint violation: {}", msg);
                (StatusCode::CONFLICT, ErrorCode::ConstraintViolation, msg.clone())
            }
            AppError::NoSelection => {
                (StatusCode::BAD_REQUEST, ErrorCode::NoSelection, self.to_string())
            }
            AppError::NothingToReturn => {
                (StatusCode::NOT_FOUND, ErrorCode::NothingToReturn, self.to_string())
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
