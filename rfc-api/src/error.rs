//! Error Types for the RFC API
//!
//! Defines the structured error response for the HTTP layer: an `ErrorCode`
//! enum categorizing the failure, an `ApiError` struct carrying the
//! serialized body, and the `IntoResponse` mapping to HTTP status codes.
//! Domain errors from rfc-core convert into `ApiError` at the handler
//! boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rfc_core::{EntityKind, RfcError};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication errors (401, 403)
    /// Request lacks valid authentication credentials
    Unauthorized,

    /// Request is authenticated but lacks permission for the resource
    Forbidden,

    // Validation errors (400)
    /// Request validation failed
    ValidationFailed,

    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    // Not found errors (404)
    /// Requested entity does not exist
    EntityNotFound,

    /// Requested RFC does not exist
    RfcNotFound,

    /// Requested subsystem link does not exist
    SubsystemNotFound,

    /// Requested user does not exist
    UserNotFound,

    // Conflict errors (409)
    /// State-machine rule violation
    InvalidTransition,

    // Server errors (500)
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,

            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingField => StatusCode::BAD_REQUEST,

            ErrorCode::EntityNotFound
            | ErrorCode::RfcNotFound
            | ErrorCode::SubsystemNotFound
            | ErrorCode::UserNotFound => StatusCode::NOT_FOUND,

            ErrorCode::InvalidTransition => StatusCode::CONFLICT,

            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Authentication required",
            ErrorCode::Forbidden => "Access forbidden",
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::RfcNotFound => "RFC not found",
            ErrorCode::SubsystemNotFound => "Subsystem link not found",
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::InvalidTransition => "Status transition not permitted",
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    /// Create an Unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create a Forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create a MissingField error.
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field missing: {}", field),
        )
    }

    /// Create an RfcNotFound error.
    pub fn rfc_not_found(id: Uuid) -> Self {
        Self::new(ErrorCode::RfcNotFound, format!("RFC not found: {}", id))
    }

    /// Create a SubsystemNotFound error.
    pub fn subsystem_not_found(id: Uuid) -> Self {
        Self::new(
            ErrorCode::SubsystemNotFound,
            format!("Subsystem link not found: {}", id),
        )
    }

    /// Create an InvalidTransition error.
    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTransition, message)
    }

    /// Create an InternalError.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self)).into_response()
    }
}

impl From<RfcError> for ApiError {
    fn from(err: RfcError) -> Self {
        match &err {
            RfcError::Storage(rfc_core::StorageError::NotFound { entity, id }) => {
                let code = match entity {
                    EntityKind::Rfc => ErrorCode::RfcNotFound,
                    EntityKind::AffectedSubsystem | EntityKind::Subsystem => {
                        ErrorCode::SubsystemNotFound
                    }
                    EntityKind::User => ErrorCode::UserNotFound,
                    _ => ErrorCode::EntityNotFound,
                };
                ApiError::new(code, format!("{:?} not found: {}", entity, id))
            }
            RfcError::Storage(other) => ApiError::internal_error(other.to_string()),
            RfcError::Transition(e) => ApiError::invalid_transition(e.to_string()),
            RfcError::Access(e) => ApiError::forbidden(e.to_string()),
            RfcError::Validation(e) => ApiError::new(ErrorCode::ValidationFailed, e.to_string()),
        }
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rfc_core::{AccessError, StorageError, TransitionError};

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(
            ErrorCode::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ErrorCode::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::RfcNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::InvalidTransition.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::InternalError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_storage_not_found() {
        let err: ApiError = RfcError::Storage(StorageError::NotFound {
            entity: EntityKind::Rfc,
            id: Uuid::nil(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::RfcNotFound);
    }

    #[test]
    fn test_from_transition_error() {
        let err: ApiError = RfcError::Transition(TransitionError::AlreadySet {
            status: "DONE".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_from_access_error() {
        let err: ApiError = RfcError::Access(AccessError::ApprovalDenied {
            user_id: Uuid::nil(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn test_details_skipped_when_absent() {
        let err = ApiError::from_code(ErrorCode::RfcNotFound);
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("details"));
        assert!(json.contains("RFC_NOT_FOUND"));
    }
}
