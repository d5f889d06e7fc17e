use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::{error, warn};
use serde::Serialize;
use std::fmt;

use crate::db::StoreError;
use crate::intake::RejectionReason;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    UnsupportedMediaType(String),
    DatabaseError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload Too Large: {}", msg),
            AppError::UnsupportedMediaType(msg) => write!(f, "Unsupported Media Type: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // details stay in the log
            AppError::DatabaseError(_) => "Storage failure".to_string(),
            AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::UnsupportedMediaType(msg) => msg.clone(),
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse { error: message })
    }
}

impl From<RejectionReason> for AppError {
    fn from(reason: RejectionReason) -> Self {
        warn!("upload rejected: {}", reason);
        match reason {
            RejectionReason::MalformedRequest(_)
            | RejectionReason::NoFileNameProvided
            | RejectionReason::EmptyFile
            | RejectionReason::StreamInterrupted(_) => AppError::BadRequest(reason.to_string()),
            RejectionReason::UnsupportedExtension { .. } => {
                AppError::UnsupportedMediaType(reason.to_string())
            }
            RejectionReason::SizeLimitExceeded { .. } => AppError::PayloadTooLarge(reason.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("File not found".to_string()),
            StoreError::ConcurrentUpdateConflict => {
                warn!("update conflict: {}", err);
                AppError::Conflict("File was modified by another request".to_string())
            }
            StoreError::Database(_) | StoreError::Migrate(_) => {
                error!("{}", err);
                AppError::DatabaseError(err.to_string())
            }
        }
    }
}
