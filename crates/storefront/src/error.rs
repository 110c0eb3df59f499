//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client with a JSON body. All route handlers
//! return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use ezcentials_core::sync::{LedgerError, StorageWriteError};
use ezcentials_core::{CatalogError, FieldError};

use crate::reviews::{ReviewError, ReviewStoreError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Review operation failed.
    #[error("Review error: {0}")]
    Reviews(#[from] ReviewError),

    /// Reading or writing the order slots failed.
    #[error("Order storage error: {0}")]
    Ledger(#[from] LedgerError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownCategory(slug) => Self::NotFound(format!("category {slug}")),
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "<[FieldError]>::is_empty")]
    errors: &'a [FieldError],
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Reviews(err) => match err {
                ReviewError::NotSignedIn => StatusCode::UNAUTHORIZED,
                ReviewError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ReviewError::UnknownProduct(_) | ReviewError::NotFound(_) => StatusCode::NOT_FOUND,
                ReviewError::NotAuthor(_) => StatusCode::FORBIDDEN,
                ReviewError::Store(ReviewStoreError::Firestore(_)) => StatusCode::BAD_GATEWAY,
                ReviewError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Ledger(err) => match err {
                LedgerError::DuplicateOrder(_) => StatusCode::CONFLICT,
                LedgerError::Write {
                    source: StorageWriteError::QuotaExceeded { .. },
                    ..
                } => StatusCode::INSUFFICIENT_STORAGE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Reviews(ReviewError::Store(ReviewStoreError::Firestore(_))) => {
                "External service error".to_string()
            }
            Self::Reviews(ReviewError::Invalid(_)) => "Validation failed".to_string(),
            Self::Reviews(err) if status.is_client_error() => err.to_string(),
            Self::Ledger(LedgerError::DuplicateOrder(id)) => format!("Order {id} already exists"),
            Self::Ledger(_) if status == StatusCode::INSUFFICIENT_STORAGE => {
                "Order storage is full".to_string()
            }
            Self::Reviews(_) | Self::Ledger(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let errors: &[FieldError] = match &self {
            Self::Reviews(ReviewError::Invalid(validation)) => validation.errors.as_slice(),
            _ => &[],
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                errors,
            }),
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
