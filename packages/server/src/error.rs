use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::vault::VaultError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `NOT_FOUND`, `PAYLOAD_TOO_LARGE`, `QUOTA_EXCEEDED`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "name cannot be empty")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    NotFound(String),
    PayloadTooLarge(String),
    QuotaExceeded(String),
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::TokenMissing => "TOKEN_MISSING",
            AppError::TokenInvalid => "TOKEN_INVALID",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let code = self.code();
        match self {
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, ErrorBody { code, message }),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code,
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code,
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, ErrorBody { code, message }),
            AppError::PayloadTooLarge(message) => {
                (StatusCode::PAYLOAD_TOO_LARGE, ErrorBody { code, message })
            }
            AppError::QuotaExceeded(message) => {
                (StatusCode::INSUFFICIENT_STORAGE, ErrorBody { code, message })
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code,
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }

    /// The JSON body for this error, without the status code.
    pub fn into_body(self) -> ErrorBody {
        self.status_and_body().1
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<VaultError> for AppError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::TooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            VaultError::QuotaExceeded { .. } => AppError::QuotaExceeded(err.to_string()),
            VaultError::InvalidName(_) => AppError::Validation(err.to_string()),
            VaultError::InvariantViolation(_)
            | VaultError::Contention(_)
            | VaultError::Database(_)
            | VaultError::Storage(_)
            | VaultError::Read(_) => AppError::Internal(err.to_string()),
        }
    }
}
