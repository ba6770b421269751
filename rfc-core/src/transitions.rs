//! Subsystem status state machines
//!
//! Two independent axes per subsystem link. Confirmation leaves `Pending`
//! exactly once; execution moves strictly forward one stage at a time.

use crate::{ConfirmationStatus, ExecutionStatus, TransitionError};

/// Validate a confirmation status transition.
///
/// Allowed moves: `Pending -> Confirmed` and `Pending -> Rejected`. A link
/// that has been confirmed or rejected is settled for good.
pub fn validate_confirmation_transition(
    current: ConfirmationStatus,
    target: ConfirmationStatus,
) -> Result<(), TransitionError> {
    if current == target {
        return Err(TransitionError::AlreadySet {
            status: current.to_string(),
        });
    }

    if current != ConfirmationStatus::Pending {
        return Err(TransitionError::ConfirmationSettled { current });
    }

    if !matches!(
        target,
        ConfirmationStatus::Confirmed | ConfirmationStatus::Rejected
    ) {
        return Err(TransitionError::InvalidConfirmationTarget { target });
    }

    Ok(())
}

/// Validate an execution status transition.
///
/// The ranks `Pending=0, InProgress=1, Done=2` must advance by exactly one:
/// no same-state writes, no regression, no skipping the middle stage.
pub fn validate_execution_transition(
    current: ExecutionStatus,
    target: ExecutionStatus,
) -> Result<(), TransitionError> {
    if current == target {
        return Err(TransitionError::AlreadySet {
            status: current.to_string(),
        });
    }

    if target.rank() <= current.rank() {
        return Err(TransitionError::ExecutionRegression { current, target });
    }

    if target.rank() - current.rank() > 1 {
        return Err(TransitionError::ExecutionStageSkipped { current, target });
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
