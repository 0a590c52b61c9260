//! Unified error handling for HTTP services.
//!
//! Every error carries a stable code. The HTTP status for a code comes from
//! the process-wide [`ErrorStatusMap`], which a service may replace once at
//! startup.

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::OnceCell;
use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication & Authorization
    #[error("access denied to this resource")]
    AuthFailed,

    #[error("invalid permissions to this resource")]
    PermFailed,

    // Request data
    #[error("{0} (cannot bind the request data)")]
    BindingFailed(String),

    #[error("{0} (cannot validate the request data)")]
    ValidationFailed(String),

    // Documents
    #[error("cannot find the document")]
    DocumentNotFound,

    #[error("cannot find all documents")]
    DocumentsNotFound,

    #[error("find multiple documents, but only one was expected")]
    MultipleDocumentsFound,

    #[error("cannot create the document")]
    DocumentNotCreate,

    #[error("cannot update the document")]
    DocumentNotUpdate,

    #[error("cannot delete the document")]
    DocumentNotDelete,

    // Outbound and limits
    #[error("request failed")]
    RequestFailed,

    #[error("limit of requests exceeded")]
    RequestsLimitExceeded,

    #[error("inactivity timeout reached")]
    InactivityTimeout,

    /// Error with an explicit status, bypassing the status map
    #[error("{message}")]
    Http { status: StatusCode, message: String },

    #[cfg(feature = "database")]
    #[error("database error")]
    Database(#[from] sea_orm::DbErr),

    // Internal
    #[error("internal server error")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

/// Full error text attached to error responses for the request logger.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl AppError {
    /// Get error code for the status map
    pub fn code(&self) -> &'static str {
        match self {
            AppError::AuthFailed => "AUTH_FAILED",
            AppError::PermFailed => "PERM_FAILED",
            AppError::BindingFailed(_) => "BINDING_FAILED",
            AppError::ValidationFailed(_) => "VALIDATION_FAILED",
            AppError::DocumentNotFound => "DOCUMENT_NOT_FOUND",
            AppError::DocumentsNotFound => "DOCUMENTS_NOT_FOUND",
            AppError::MultipleDocumentsFound => "MULTIPLE_DOCUMENTS_FOUND",
            AppError::DocumentNotCreate => "DOCUMENT_NOT_CREATE",
            AppError::DocumentNotUpdate => "DOCUMENT_NOT_UPDATE",
            AppError::DocumentNotDelete => "DOCUMENT_NOT_DELETE",
            AppError::RequestFailed => "REQUEST_FAILED",
            AppError::RequestsLimitExceeded => "REQUESTS_LIMIT_EXCEEDED",
            AppError::InactivityTimeout => "INACTIVITY_TIMEOUT",
            AppError::Http { .. } => "HTTP_ERROR",
            #[cfg(feature = "database")]
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Http { status, .. } => *status,
            _ => ErrorStatusMap::current().status_for(self.code()),
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            #[cfg(feature = "database")]
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                self.to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                self.to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Full error text including hidden details.
    pub fn detail(&self) -> String {
        match self {
            #[cfg(feature = "database")]
            AppError::Database(e) => format!("{self}: {e}"),
            AppError::Internal(msg) => format!("{self}: {msg}"),
            _ => self.to_string(),
        }
    }
}

// =============================================================================
// Status map
// =============================================================================

static STATUS_MAP: OnceCell<ErrorStatusMap> = OnceCell::new();

/// Error code to HTTP status mapping.
///
/// Codes missing from the map resolve to `500 Internal Server Error`.
#[derive(Debug, Clone)]
pub struct ErrorStatusMap {
    statuses: HashMap<&'static str, StatusCode>,
}

impl Default for ErrorStatusMap {
    fn default() -> Self {
        let statuses = HashMap::from([
            ("PERM_FAILED", StatusCode::FORBIDDEN),
            ("AUTH_FAILED", StatusCode::UNAUTHORIZED),
            ("BINDING_FAILED", StatusCode::BAD_REQUEST),
            ("VALIDATION_FAILED", StatusCode::BAD_REQUEST),
            ("DOCUMENT_NOT_FOUND", StatusCode::NOT_FOUND),
            ("DOCUMENTS_NOT_FOUND", StatusCode::NOT_FOUND),
            ("MULTIPLE_DOCUMENTS_FOUND", StatusCode::CONFLICT),
            ("REQUESTS_LIMIT_EXCEEDED", StatusCode::TOO_MANY_REQUESTS),
        ]);
        Self { statuses }
    }
}

impl ErrorStatusMap {
    /// Map with no entries; every code resolves to 500.
    pub fn empty() -> Self {
        Self {
            statuses: HashMap::new(),
        }
    }

    /// Override the status for one code.
    pub fn with(mut self, code: &'static str, status: StatusCode) -> Self {
        self.statuses.insert(code, status);
        self
    }

    pub fn status_for(&self, code: &str) -> StatusCode {
        self.statuses
            .get(code)
            .copied()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Make this map process-wide.
    ///
    /// Fails (returning the map) once a map is installed or the default has
    /// already been used.
    pub fn install(self) -> Result<(), Self> {
        STATUS_MAP.set(self)
    }

    /// The installed map, or the default one.
    pub fn current() -> &'static ErrorStatusMap {
        STATUS_MAP.get_or_init(ErrorStatusMap::default)
    }
}

// =============================================================================
// HTTP Response (Axum)
// =============================================================================

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            message: self.user_message(),
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(ErrorDetail(self.detail()));
        response
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationFailed(errors.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::DocumentNotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn binding(detail: impl Into<String>) -> Self {
        AppError::BindingFailed(detail.into())
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        AppError::ValidationFailed(detail.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        AppError::Http {
            status,
            message: message.into(),
        }
    }
}
