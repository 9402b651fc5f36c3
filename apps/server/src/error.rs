//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Stockly                                │
//! │                                                                         │
//! │  Handler: Result<Json<T>, ApiError>                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  CoreError ──────────┐                                                  │
//! │  (stock, empty, ...) │                                                  │
//! │                      ▼                                                  │
//! │  DbError ─────────► ApiError { code, message } ──► status + JSON body  │
//! │  (rows, blobs)       ▲                                                  │
//! │                      │                                                  │
//! │  Bad JSON / query ───┘                                                  │
//! │                                                                         │
//! │  Store failures are logged here and answered with a generic message.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use stockly_core::{CoreError, ValidationError};
use stockly_db::DbError;
use thiserror::Error;

use crate::config::ConfigError;

/// API error returned from handlers.
///
/// ## Serialization
/// This is what the client receives when a call fails:
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for Webcam HD: available 5, requested 6"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// No `x-user-id` header (401)
    Unauthorized,

    /// Requested more than is on hand (409)
    InsufficientStock,

    /// Status change not allowed (409)
    InvalidTransition,

    /// Duplicate SKU and similar (409)
    Conflict,

    /// Image store failed (500)
    StorageError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::InsufficientStock
            | ErrorCode::InvalidTransition
            | ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::StorageError | ErrorCode::DatabaseError | ErrorCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::InvoiceNotFound(id) => ApiError::not_found("Invoice", &id),
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, message)
            }
            CoreError::InvalidStatusTransition { .. } => {
                ApiError::new(ErrorCode::InvalidTransition, message)
            }
            CoreError::EmptyInvoice
            | CoreError::MissingProductSelection { .. }
            | CoreError::TooManyLines { .. }
            | CoreError::Validation(_) => ApiError::validation(message),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Rejected(e) => e.into(),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::CheckViolation { message } => {
                tracing::warn!("Check constraint rejected a write: {}", message);
                ApiError::validation("A value is out of range")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::Storage(e) => {
                tracing::error!("Image storage failed: {}", e);
                ApiError::new(ErrorCode::StorageError, "Image storage failed")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Startup Errors
// =============================================================================

/// Errors that stop the server from starting or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database startup failed: {0}")]
    Database(#[from] DbError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_codes() {
        let stock: ApiError = CoreError::InsufficientStock {
            product_id: "p".into(),
            name: "Webcam HD".into(),
            available: 5,
            requested: 6,
        }
        .into();
        assert_eq!(stock.code, ErrorCode::InsufficientStock);
        assert_eq!(stock.code.status(), StatusCode::CONFLICT);
        assert!(stock.message.contains("Webcam HD"));

        let empty: ApiError = CoreError::EmptyInvoice.into();
        assert_eq!(empty.code.status(), StatusCode::BAD_REQUEST);

        let missing: ApiError = CoreError::ProductNotFound("p-9".into()).into();
        assert_eq!(missing.code, ErrorCode::NotFound);
        assert_eq!(missing.message, "Product not found: p-9");
    }

    #[test]
    fn test_db_errors_hide_details() {
        let err: ApiError = DbError::QueryFailed("near \"SELEC\": syntax error".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("SELEC"));

        let dup: ApiError = DbError::duplicate("sku", "WM-001").into();
        assert_eq!(dup.code, ErrorCode::Conflict);
        assert_eq!(dup.message, "sku 'WM-001' already exists");

        let rejected: ApiError = DbError::Rejected(CoreError::EmptyInvoice).into();
        assert_eq!(rejected.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::not_found("Invoice", "abc")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Invoice not found: abc");
    }
}
