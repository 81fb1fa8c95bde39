//! The `{ data: ... }` / `{ error: ... }` envelope every JSON endpoint uses.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use quill_core::pagination::PageMeta;

/// Successful response: `{ "data": ... }`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Successful list response: `{ "data": [...], "pagination": {...} }`.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(data: Vec<T>, pagination: PageMeta) -> Self {
        Self { data, pagination }
    }
}

/// One field-level validation failure, reported under `error.details`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    pub fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Error envelope: `{ "error": { message, code, details?, requestId } }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(rename = "requestId")]
    pub request_id: String,
}

impl ErrorBody {
    /// Build an error envelope with a freshly generated request id; the
    /// same id goes to the log line for correlation.
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                code,
                details: None,
                request_id: Uuid::new_v4().to_string(),
            },
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.error.details = Some(details);
        self
    }

    pub fn request_id(&self) -> &str {
        &self.error.request_id
    }
}
