use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Unprocessable Entity",
    "message": "The given data was invalid",
    "errors": { "equipments": ["The equipment \"Microscope A\" (#5) is already reserved between 2024-01-01 10:00:00 and 2024-01-01 12:00:00"] },
    "request_id": "req-abc123xyz",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Unprocessable Entity")
    #[schema(example = "Not Found")]
    pub error: String,
    /// Human-readable error description
    #[schema(example = "Manip 12 not found")]
    pub message: String,
    /// Field name to validation messages, present on 422 responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
    /// Unique request identifier for support and debugging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when error occurred
    #[schema(example = "2024-12-09T10:30:00.000Z")]
    pub timestamp: String,
}

/// Category of a field-level validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A mandatory field was absent or empty
    FieldRequired,
    /// A field was present but malformed (length, type, date format)
    FieldFormat,
    /// A referenced identity does not exist
    ForeignKeyMissing,
    /// A domain rule rejected the candidate (hours, conflict, team)
    BusinessRuleViolation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub kind: ViolationKind,
    pub message: String,
}

/// Collected field violations for a single request.
///
/// Violations keep insertion order per field so clients see messages in the
/// order the checks ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    violations: Vec<FieldViolation>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, kind: ViolationKind, message: impl Into<String>) -> Self {
        let mut report = Self::new();
        report.push(field, kind, message);
        report
    }

    pub fn push(&mut self, field: &str, kind: ViolationKind, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field: field.to_string(),
            kind,
            message: message.into(),
        });
    }

    pub fn required(&mut self, field: &str) {
        self.push(
            field,
            ViolationKind::FieldRequired,
            format!("The {} field is required.", humanize(field)),
        );
    }

    pub fn extend(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn has(&self, field: &str, kind: ViolationKind) -> bool {
        self.violations
            .iter()
            .any(|v| v.field == field && v.kind == kind)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    pub fn field_errors(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for violation in &self.violations {
            map.entry(violation.field.clone())
                .or_default()
                .push(violation.message.clone());
        }
        map
    }

    /// Ok when nothing was recorded, otherwise the report as a 422 error
    pub fn into_result(self) -> Result<(), ServiceError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect();
        write!(f, "{}", rendered.join("; "))
    }
}

impl From<validator::ValidationErrors> for ValidationReport {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut report = ValidationReport::new();
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        for (field, field_errors) in fields {
            for error in field_errors {
                if error.code == "required" {
                    report.required(field);
                    continue;
                }
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| default_format_message(field, error));
                report.push(field, ViolationKind::FieldFormat, message);
            }
        }
        report
    }
}

fn humanize(field: &str) -> String {
    field.replace('_', " ")
}

fn default_format_message(field: &str, error: &validator::ValidationError) -> String {
    let name = humanize(field);
    match error.code.as_ref() {
        "length" => {
            let max = error.params.get("max").and_then(|v| v.as_u64());
            let too_long = match (max, error.params.get("value").and_then(|v| v.as_str())) {
                (Some(max), Some(value)) => value.chars().count() as u64 > max,
                _ => false,
            };
            match (max, error.params.get("min")) {
                (Some(max), None) => {
                    format!("The {} may not be greater than {} characters.", name, max)
                }
                (Some(max), Some(_)) if too_long => {
                    format!("The {} may not be greater than {} characters.", name, max)
                }
                (_, Some(min)) => format!("The {} must contain at least {} item(s).", name, min),
                _ => format!("The {} has an invalid length.", name),
            }
        }
        "email" => format!("The {} must be a valid email address.", name),
        "range" => format!("The {} is out of range.", name),
        "regex" => format!("The {} format is invalid.", name),
        _ => format!("The {} is invalid.", name),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("The given data was invalid: {0}")]
    Validation(ValidationReport),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Hash error: {0}")]
    HashError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(err.into())
    }
}

impl From<ValidationReport> for ServiceError {
    fn from(report: ValidationReport) -> Self {
        ServiceError::Validation(report)
    }
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

/// True for errors a client can resolve by retrying the same request:
/// serialization failures, deadlocks and SQLite busy locks.
pub fn is_retryable_conflict(err: &DbErr) -> bool {
    let text = err.to_string().to_ascii_lowercase();
    text.contains("could not serialize access")
        || text.contains("40001")
        || text.contains("deadlock detected")
        || text.contains("database is locked")
}

impl ServiceError {
    /// Normalizes any supported database error input, classifying
    /// serialization failures as conflicts.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        let err = error.into_db_err();
        if is_retryable_conflict(&err) {
            return ServiceError::Conflict(
                "A concurrent reservation changed the schedule; retry the request".to_string(),
            );
        }
        if let Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return ServiceError::Conflict(format!("Duplicate value: {}", detail));
        }
        ServiceError::DatabaseError(err)
    }

    pub fn validation(field: &str, kind: ViolationKind, message: impl Into<String>) -> Self {
        ServiceError::Validation(ValidationReport::single(field, kind, message))
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::HashError(_) | Self::InternalError(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::HashError(_) | Self::InternalError(_) | Self::Other(_) => {
                "Internal server error".to_string()
            }
            Self::Validation(_) => "The given data was invalid".to_string(),
            Self::NotFound(msg) | Self::BadRequest(msg) | Self::Conflict(msg) => msg.clone(),
            Self::Unauthorized(msg) => format!("Unauthorized: {}", msg),
        }
    }

    fn field_errors(&self) -> Option<BTreeMap<String, Vec<String>>> {
        match self {
            Self::Validation(report) => Some(report.field_errors()),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            errors: self.field_errors(),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

/// API Error type for HTTP responses
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Service error: {0}")]
    ServiceError(#[from] ServiceError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ServiceError(service_error) => service_error.into_response(),
            ApiError::NotFound(msg) => ServiceError::NotFound(msg).into_response(),
            ApiError::BadRequest(msg) => ServiceError::BadRequest(msg).into_response(),
        }
    }
}
