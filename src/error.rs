use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::ports::RepositoryError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("lead {0} not found")]
    LeadNotFound(Uuid),

    #[error("transaction {0} not found")]
    TransactionNotFound(Uuid),

    #[error("transaction {0} is already resolved")]
    AlreadyResolved(Uuid),

    #[error("service {0} not found")]
    ServiceNotFound(Uuid),

    #[error("setting '{0}' not found")]
    SettingNotFound(String),

    #[error("service code '{0}' is already in use")]
    ServiceCodeTaken(String),

    #[error("missing credentials: {0}")]
    AuthRequired(String),

    #[error("invalid credentials: {0}")]
    AuthInvalid(String),

    #[error("insufficient permissions: {0}")]
    Forbidden(String),

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::LeadNotFound(_) => "LEAD_NOT_FOUND",
            AppError::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            AppError::AlreadyResolved(_) => "TRANSACTION_ALREADY_RESOLVED",
            AppError::ServiceNotFound(_) => "SERVICE_NOT_FOUND",
            AppError::SettingNotFound(_) => "SETTING_NOT_FOUND",
            AppError::ServiceCodeTaken(_) => "SERVICE_CODE_EXISTS",
            AppError::AuthRequired(_) => "AUTH_REQUIRED",
            AppError::AuthInvalid(_) => "AUTH_INVALID",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::RateLimited => "RATE_LIMIT",
            AppError::Repository(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::LeadNotFound(_)
            | AppError::TransactionNotFound(_)
            | AppError::ServiceNotFound(_)
            | AppError::SettingNotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyResolved(_) | AppError::ServiceCodeTaken(_) => StatusCode::CONFLICT,
            AppError::AuthRequired(_) | AppError::AuthInvalid(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Repository(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal failures collapse to a generic
    /// message; the detail only goes to the log.
    fn public_message(&self) -> String {
        match self {
            AppError::Repository(_) | AppError::Internal(_) => {
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }
        let body = Json(json!({
            "success": false,
            "code": self.code(),
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}
