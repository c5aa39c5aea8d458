//! Error handling for the application

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::access_codes::AccessCodeError;
use crate::conference::{BookingError, BookingStatus};
use crate::currency::CurrencyError;

/// Failure reported by a storage collaborator (bookings or access codes)
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The authoritative overlap check rejected the write
    #[error("Slot is no longer available")]
    SlotTaken,

    #[error("Record not found")]
    NotFound,

    /// The record left the status a conditional write expected
    #[error("Record is now {actual}")]
    StatusChanged { actual: BookingStatus },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error(transparent)]
    AccessCode(#[from] AccessCodeError),

    #[error(transparent)]
    Currency(#[from] CurrencyError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// JSON body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Booking(e) => match e {
                BookingError::Validation(_) | BookingError::Schedule(_) => {
                    (StatusCode::BAD_REQUEST, "validation_error")
                }
                BookingError::SlotUnavailable { .. } => (StatusCode::CONFLICT, "slot_unavailable"),
                BookingError::SlotNoLongerAvailable => {
                    (StatusCode::CONFLICT, "slot_no_longer_available")
                }
                BookingError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                BookingError::InvalidTransition { .. } => {
                    (StatusCode::CONFLICT, "invalid_transition")
                }
                BookingError::Persistence(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "persistence_failure")
                }
            },
            AppError::AccessCode(e) => match e {
                AccessCodeError::NotFound => (StatusCode::NOT_FOUND, "access_code_not_found"),
                AccessCodeError::Deactivated => (StatusCode::FORBIDDEN, "access_code_deactivated"),
                AccessCodeError::AlreadyUsed => (StatusCode::FORBIDDEN, "access_code_already_used"),
                AccessCodeError::RoleMismatch { .. } => {
                    (StatusCode::FORBIDDEN, "access_code_role_mismatch")
                }
                AccessCodeError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_failure"),
            },
            AppError::Currency(_) => (StatusCode::BAD_REQUEST, "currency_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();

        // Server-side failures are logged in full but only summarised to the client
        let message = if status.is_server_error() {
            tracing::error!("{}: {}", error_type, self);
            match error_type {
                "persistence_failure" => {
                    "Your request could not be saved. Please try again.".to_string()
                }
                _ => "Internal error".to_string(),
            }
        } else {
            self.to_string()
        };

        let details = match &self {
            AppError::Booking(BookingError::Validation(errors)) => serde_json::to_value(errors).ok(),
            _ => None,
        };

        let body = ErrorResponse {
            error_type: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
