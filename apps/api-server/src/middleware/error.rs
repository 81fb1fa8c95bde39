//! Central error type. Every failure leaves the process as the
//! `{ error: { message, code, details?, requestId } }` envelope; errors are
//! recovered at the request boundary only, with no retry of store
//! operations.

use std::fmt;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use quill_infra::StoreError;
use quill_shared::{ErrorBody, FieldError};

#[derive(Debug)]
pub enum AppError {
    /// 400 with field-level details.
    Validation(Vec<FieldError>),
    /// 400 for unparseable request bodies.
    InvalidJson,
    /// 400 with a caller-supplied code (e.g. INVALID_ROLE).
    BadRequest {
        code: &'static str,
        message: &'static str,
    },
    /// 401: no usable bearer credential.
    Unauthorized,
    /// 401: credential present but expired or tampered.
    InvalidToken,
    /// 401: login failed; identical for unknown email and wrong password.
    InvalidCredentials,
    /// 403 with a context message.
    Forbidden(&'static str),
    /// 403: correct credentials, banned account.
    Banned,
    NotFound(&'static str),
    /// 409 with a caller-supplied code (EMAIL_EXISTS, DUPLICATE).
    Conflict {
        code: &'static str,
        message: &'static str,
    },
    /// 429 with a retry-after hint in seconds.
    RateLimited { retry_after_secs: u64 },
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => write!(f, "validation failed ({} fields)", errors.len()),
            AppError::InvalidJson => write!(f, "invalid JSON in request body"),
            AppError::BadRequest { message, .. } => write!(f, "bad request: {message}"),
            AppError::Unauthorized => write!(f, "authentication required"),
            AppError::InvalidToken => write!(f, "invalid or expired token"),
            AppError::InvalidCredentials => write!(f, "invalid credentials"),
            AppError::Forbidden(message) => write!(f, "forbidden: {message}"),
            AppError::Banned => write!(f, "account banned"),
            AppError::NotFound(message) => write!(f, "not found: {message}"),
            AppError::Conflict { message, .. } => write!(f, "conflict: {message}"),
            AppError::RateLimited { retry_after_secs } => {
                write!(f, "rate limited, retry in {retry_after_secs}s")
            }
            AppError::Internal(detail) => write!(f, "internal error: {detail}"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidJson | AppError::BadRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized | AppError::InvalidToken | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) | AppError::Banned => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation(errors) => {
                ErrorBody::new("VALIDATION_ERROR", "Validation failed")
                    .with_details(json!(errors))
            }
            AppError::InvalidJson => {
                ErrorBody::new("INVALID_JSON", "Invalid JSON in request body")
            }
            AppError::BadRequest { code, message } => ErrorBody::new(code, *message),
            AppError::Unauthorized => ErrorBody::new("UNAUTHORIZED", "Authentication required"),
            AppError::InvalidToken => ErrorBody::new("INVALID_TOKEN", "Invalid or expired token"),
            AppError::InvalidCredentials => {
                ErrorBody::new("INVALID_CREDENTIALS", "Invalid email or password")
            }
            AppError::Forbidden(message) => ErrorBody::new("FORBIDDEN", *message),
            AppError::Banned => ErrorBody::new("BANNED", "Account has been banned"),
            AppError::NotFound(message) => ErrorBody::new("NOT_FOUND", *message),
            AppError::Conflict { code, message } => ErrorBody::new(code, *message),
            AppError::RateLimited { retry_after_secs } => ErrorBody::new(
                "RATE_LIMIT_EXCEEDED",
                "Too many requests, please try again later.",
            )
            .with_details(json!({ "retryAfter": retry_after_secs })),
            AppError::Internal(detail) => {
                // Internal details stay in the logs outside debug builds.
                let message = if cfg!(debug_assertions) {
                    detail.clone()
                } else {
                    "An unexpected error occurred".to_string()
                };
                ErrorBody::new("INTERNAL_ERROR", message)
            }
        };

        if matches!(self, AppError::Internal(_)) {
            tracing::error!(request_id = body.request_id(), error = %self, "request failed");
        } else {
            tracing::debug!(request_id = body.request_id(), error = %self, "request rejected");
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<Vec<FieldError>> for AppError {
    fn from(errors: Vec<FieldError>) -> Self {
        AppError::Validation(errors)
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
