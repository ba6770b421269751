//! Error types for RFC workflow operations

use crate::{ConfirmationStatus, ExecutionStatus};
use thiserror::Error;
use uuid::Uuid;

/// Entity kind discriminator for storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Rfc,
    AffectedSubsystem,
    Approval,
    StatusChangeRecord,
    RfcSnapshot,
    User,
    System,
    Subsystem,
    Attachment,
}

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity:?} with id {id}")]
    NotFound { entity: EntityKind, id: Uuid },

    #[error("Insert failed for {entity:?}: {reason}")]
    InsertFailed { entity: EntityKind, reason: String },

    #[error("Update failed for {entity:?} with id {id}: {reason}")]
    UpdateFailed {
        entity: EntityKind,
        id: Uuid,
        reason: String,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// State-machine rule violations on a subsystem link.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Status is already {status}")]
    AlreadySet { status: String },

    #[error("Confirmation status is settled at {current}, transitions are only allowed from PENDING")]
    ConfirmationSettled { current: ConfirmationStatus },

    #[error("Confirmation status may only move to CONFIRMED or REJECTED, got {target}")]
    InvalidConfirmationTarget { target: ConfirmationStatus },

    #[error("Execution status may not move backwards: {current} -> {target}")]
    ExecutionRegression {
        current: ExecutionStatus,
        target: ExecutionStatus,
    },

    #[error("Execution status may not skip a stage: {current} -> {target}")]
    ExecutionStageSkipped {
        current: ExecutionStatus,
        target: ExecutionStatus,
    },
}

/// Role/ownership check failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("User {user_id} may not change statuses of subsystem link {link_id}")]
    SubsystemStatusDenied { user_id: Uuid, link_id: Uuid },

    #[error("User {user_id} lacks an approver role")]
    ApprovalDenied { user_id: Uuid },
}

/// Malformed input errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Master error type for workflow operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RfcError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),

    #[error("Access error: {0}")]
    Access(#[from] AccessError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type alias for workflow operations.
pub type RfcResult<T> = Result<T, RfcError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound {
            entity: EntityKind::Rfc,
            id: Uuid::nil(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Entity not found"));
        assert!(msg.contains("Rfc"));
    }

    #[test]
    fn test_transition_error_display() {
        let err = TransitionError::ExecutionStageSkipped {
            current: ExecutionStatus::Pending,
            target: ExecutionStatus::Done,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("skip"));
        assert!(msg.contains("PENDING"));
        assert!(msg.contains("DONE"));
    }

    #[test]
    fn test_rfc_error_from_variants() {
        let storage = RfcError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, RfcError::Storage(_)));

        let transition = RfcError::from(TransitionError::AlreadySet {
            status: "DONE".to_string(),
        });
        assert!(matches!(transition, RfcError::Transition(_)));

        let access = RfcError::from(AccessError::ApprovalDenied {
            user_id: Uuid::nil(),
        });
        assert!(matches!(access, RfcError::Access(_)));

        let validation = RfcError::from(ValidationError::RequiredFieldMissing {
            field: "title".to_string(),
        });
        assert!(matches!(validation, RfcError::Validation(_)));
    }
}
