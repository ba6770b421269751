//! Aggregate status derivation
//!
//! A pure, total function of (subsystem states, approval states, current
//! status). The I/O loop that feeds it rows and performs the board sync
//! side effect lives in the api crate's status refresh job.

use crate::{
    AffectedSubsystem, Approval, ConfirmationStatus, EntityId, ExecutionStatus, RfcStatus,
};

/// Compute the status an RFC should hold, given its subsystem links, the
/// approval ledger rows for it, and the set of users currently holding an
/// approver role.
///
/// Rule order matters - later rules only apply when earlier ones do not:
///
/// 1. Terminal statuses are returned unchanged.
/// 2. Any subsystem with a rejected confirmation -> `Rejected`.
/// 3. Any subsystem still pending confirmation -> `New`.
/// 4. With approvers present and every one of them holding a live approved
///    record: all executions done -> `Implemented`, otherwise -> `Approved`.
/// 5. Otherwise (including the no-approvers case) -> `UnderReview`.
pub fn derive_status(
    current: RfcStatus,
    subsystems: &[AffectedSubsystem],
    approvals: &[Approval],
    approver_ids: &[EntityId],
) -> RfcStatus {
    if current.is_terminal() {
        return current;
    }

    let any_rejected = subsystems
        .iter()
        .any(|s| s.confirmation_status == ConfirmationStatus::Rejected);
    if any_rejected {
        return RfcStatus::Rejected;
    }

    let any_pending = subsystems
        .iter()
        .any(|s| s.confirmation_status == ConfirmationStatus::Pending);
    if any_pending {
        return RfcStatus::New;
    }

    if !approver_ids.is_empty() {
        let all_approved = approver_ids.iter().all(|approver| {
            approvals
                .iter()
                .any(|a| a.approver_id == *approver && a.approved)
        });

        if all_approved {
            let all_done = subsystems
                .iter()
                .all(|s| s.execution_status == ExecutionStatus::Done);

            if all_done {
                return RfcStatus::Implemented;
            }
            return RfcStatus::Approved;
        }
    }

    RfcStatus::UnderReview
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::new_entity_id;
    use chrono::Utc;

    fn link(confirmation: ConfirmationStatus, execution: ExecutionStatus) -> AffectedSubsystem {
        let now = Utc::now();
        AffectedSubsystem {
            id: new_entity_id(),
            rfc_id: new_entity_id(),
            subsystem_id: new_entity_id(),
            executor_id: new_entity_id(),
            confirmation_status: confirmation,
            execution_status: execution,
            created_at: now,
            updated_at: now,
        }
    }

    fn approval(approver_id: EntityId, approved: bool) -> Approval {
        let now = Utc::now();
        Approval {
            id: new_entity_id(),
            rfc_id: new_entity_id(),
            approver_id,
            approved,
            comment: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_terminal_status_short_circuits() {
        let subsystems = vec![link(ConfirmationStatus::Pending, ExecutionStatus::Pending)];
        assert_eq!(
            derive_status(RfcStatus::Implemented, &subsystems, &[], &[]),
            RfcStatus::Implemented
        );
        assert_eq!(
            derive_status(RfcStatus::Rejected, &subsystems, &[], &[]),
            RfcStatus::Rejected
        );
    }

    #[test]
    fn test_any_rejected_confirmation_wins() {
        let subsystems = vec![
            link(ConfirmationStatus::Confirmed, ExecutionStatus::Done),
            link(ConfirmationStatus::Rejected, ExecutionStatus::Pending),
            link(ConfirmationStatus::Pending, ExecutionStatus::Pending),
        ];
        assert_eq!(
            derive_status(RfcStatus::New, &subsystems, &[], &[]),
            RfcStatus::Rejected
        );
    }

    #[test]
    fn test_pending_confirmation_yields_new_regardless_of_approvals() {
        let approver = new_entity_id();
        let subsystems = vec![link(ConfirmationStatus::Pending, ExecutionStatus::Pending)];
        let approvals = vec![approval(approver, true)];
        assert_eq!(
            derive_status(RfcStatus::UnderReview, &subsystems, &approvals, &[approver]),
            RfcStatus::New
        );
    }

    #[test]
    fn test_no_approvers_yields_under_review() {
        let subsystems = vec![link(ConfirmationStatus::Confirmed, ExecutionStatus::Done)];
        assert_eq!(
            derive_status(RfcStatus::New, &subsystems, &[], &[]),
            RfcStatus::UnderReview
        );
    }

    #[test]
    fn test_partial_approvals_yield_under_review() {
        let a = new_entity_id();
        let b = new_entity_id();
        let subsystems = vec![link(ConfirmationStatus::Confirmed, ExecutionStatus::Pending)];
        let approvals = vec![approval(a, true), approval(b, false)];
        assert_eq!(
            derive_status(RfcStatus::New, &subsystems, &approvals, &[a, b]),
            RfcStatus::UnderReview
        );
    }

    #[test]
    fn test_all_approved_not_all_done_yields_approved() {
        let a = new_entity_id();
        let subsystems = vec![
            link(ConfirmationStatus::Confirmed, ExecutionStatus::Done),
            link(ConfirmationStatus::Confirmed, ExecutionStatus::InProgress),
        ];
        let approvals = vec![approval(a, true)];
        assert_eq!(
            derive_status(RfcStatus::UnderReview, &subsystems, &approvals, &[a]),
            RfcStatus::Approved
        );
    }

    #[test]
    fn test_all_approved_all_done_yields_implemented() {
        let a = new_entity_id();
        let b = new_entity_id();
        let subsystems = vec![
            link(ConfirmationStatus::Confirmed, ExecutionStatus::Done),
            link(ConfirmationStatus::Confirmed, ExecutionStatus::Done),
        ];
        let approvals = vec![approval(a, true), approval(b, true)];
        assert_eq!(
            derive_status(RfcStatus::Approved, &subsystems, &approvals, &[a, b]),
            RfcStatus::Implemented
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = new_entity_id();
        let subsystems = vec![link(ConfirmationStatus::Confirmed, ExecutionStatus::Pending)];
        let approvals = vec![approval(a, true)];
        let first = derive_status(RfcStatus::New, &subsystems, &approvals, &[a]);
        for _ in 0..10 {
            assert_eq!(
                derive_status(RfcStatus::New, &subsystems, &approvals, &[a]),
                first
            );
        }
    }

    #[test]
    fn test_no_subsystems_with_all_approved_is_implemented() {
        // Vacuously true "all executions done" - an RFC with no affected
        // subsystems completes as soon as every approver signs off.
        let a = new_entity_id();
        let approvals = vec![approval(a, true)];
        assert_eq!(
            derive_status(RfcStatus::New, &[], &approvals, &[a]),
            RfcStatus::Implemented
        );
    }
}
