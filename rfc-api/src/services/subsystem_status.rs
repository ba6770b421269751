//! Subsystem status transitions
//!
//! Applies the two state machines to one subsystem link: resolve the link,
//! check access, validate the transition, persist the new value together
//! with its history record. No status recomputation happens here - the
//! derivation job observes the change on its next tick.

use crate::error::{ApiError, ApiResult};
use rfc_core::{
    new_entity_id, validate_confirmation_transition, validate_execution_transition, AccessError,
    AffectedSubsystem, ConfirmationStatus, EntityId, ExecutionStatus, RfcError, StatusAxis,
    StatusChangeRecord, User, UserRole,
};
use rfc_storage::{AffectedSubsystemUpdate, StorageTrait};

/// Apply a confirmation status transition to one subsystem link.
pub fn update_confirmation_status(
    store: &dyn StorageTrait,
    rfc_id: EntityId,
    link_id: EntityId,
    target: ConfirmationStatus,
    current_user: &User,
) -> ApiResult<AffectedSubsystem> {
    tracing::info!(%rfc_id, %link_id, target = %target, "Updating confirmation status");

    let mut link = find_link(store, rfc_id, link_id)?;
    validate_access(&link, current_user)?;

    validate_confirmation_transition(link.confirmation_status, target)
        .map_err(RfcError::from)?;

    let record = StatusChangeRecord {
        id: new_entity_id(),
        affected_subsystem_id: link.id,
        axis: StatusAxis::Confirmation,
        old_status: Some(link.confirmation_status.to_string()),
        new_status: target.to_string(),
        changed_by: current_user.id,
        created_at: chrono::Utc::now(),
    };

    store.record_subsystem_transition(
        link.id,
        AffectedSubsystemUpdate {
            confirmation_status: Some(target),
            execution_status: None,
        },
        record,
    )?;

    tracing::info!(%link_id, "Confirmation status updated");

    link.confirmation_status = target;
    Ok(link)
}

/// Apply an execution status transition to one subsystem link.
pub fn update_execution_status(
    store: &dyn StorageTrait,
    rfc_id: EntityId,
    link_id: EntityId,
    target: ExecutionStatus,
    current_user: &User,
) -> ApiResult<AffectedSubsystem> {
    tracing::info!(%rfc_id, %link_id, target = %target, "Updating execution status");

    let mut link = find_link(store, rfc_id, link_id)?;
    validate_access(&link, current_user)?;

    validate_execution_transition(link.execution_status, target).map_err(RfcError::from)?;

    let record = StatusChangeRecord {
        id: new_entity_id(),
        affected_subsystem_id: link.id,
        axis: StatusAxis::Execution,
        old_status: Some(link.execution_status.to_string()),
        new_status: target.to_string(),
        changed_by: current_user.id,
        created_at: chrono::Utc::now(),
    };

    store.record_subsystem_transition(
        link.id,
        AffectedSubsystemUpdate {
            confirmation_status: None,
            execution_status: Some(target),
        },
        record,
    )?;

    tracing::info!(%link_id, "Execution status updated");

    link.execution_status = target;
    Ok(link)
}

fn find_link(
    store: &dyn StorageTrait,
    rfc_id: EntityId,
    link_id: EntityId,
) -> ApiResult<AffectedSubsystem> {
    store
        .link_get_for_rfc(rfc_id, link_id)?
        .ok_or_else(|| ApiError::subsystem_not_found(link_id))
}

/// Only the link's designated executor or an administrator may move either
/// status axis.
fn validate_access(link: &AffectedSubsystem, current_user: &User) -> Result<(), RfcError> {
    let is_admin = current_user.role == UserRole::Admin;
    let is_executor = link.executor_id == current_user.id;

    if !is_admin && !is_executor {
        tracing::warn!(user_id = %current_user.id, link_id = %link.id, "Subsystem status change denied");
        return Err(AccessError::SubsystemStatusDenied {
            user_id: current_user.id,
            link_id: link.id,
        }
        .into());
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::Utc;
    use rfc_core::{Rfc, RfcStatus, Urgency};
    use rfc_storage::InMemoryStorage;

    fn seed_user(store: &InMemoryStorage, role: UserRole) -> User {
        let user = User {
            id: new_entity_id(),
            username: format!("user-{}", new_entity_id()),
            full_name: "Test User".to_string(),
            email: format!("{}@example.com", new_entity_id()),
            role,
            board_user_id: None,
        };
        store.user_insert(&user).unwrap();
        user
    }

    fn seed_rfc_with_link(store: &InMemoryStorage, executor: &User) -> (Rfc, AffectedSubsystem) {
        let now = Utc::now();
        let rfc = Rfc {
            id: new_entity_id(),
            number: store.rfc_next_number(),
            title: "Swap load balancer".to_string(),
            description: None,
            urgency: Urgency::Planned,
            status: RfcStatus::New,
            implementation_date: now,
            requester_id: new_entity_id(),
            board_card_id: None,
            board_status_changed_at: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        store.rfc_insert(&rfc).unwrap();

        let link = AffectedSubsystem {
            id: new_entity_id(),
            rfc_id: rfc.id,
            subsystem_id: new_entity_id(),
            executor_id: executor.id,
            confirmation_status: ConfirmationStatus::Pending,
            execution_status: ExecutionStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        store.link_insert(&link).unwrap();

        (rfc, link)
    }

    #[test]
    fn test_executor_confirms_link() {
        let store = InMemoryStorage::new();
        let executor = seed_user(&store, UserRole::Executor);
        let (rfc, link) = seed_rfc_with_link(&store, &executor);

        let updated = update_confirmation_status(
            &store,
            rfc.id,
            link.id,
            ConfirmationStatus::Confirmed,
            &executor,
        )
        .unwrap();
        assert_eq!(updated.confirmation_status, ConfirmationStatus::Confirmed);

        // One history record, tagged with the confirmation axis.
        let records = store.status_record_list_by_links(&[link.id]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].axis, StatusAxis::Confirmation);
        assert_eq!(records[0].old_status.as_deref(), Some("PENDING"));
        assert_eq!(records[0].new_status, "CONFIRMED");
    }

    #[test]
    fn test_second_confirmation_attempt_conflicts() {
        let store = InMemoryStorage::new();
        let executor = seed_user(&store, UserRole::Executor);
        let (rfc, link) = seed_rfc_with_link(&store, &executor);

        update_confirmation_status(&store, rfc.id, link.id, ConfirmationStatus::Confirmed, &executor)
            .unwrap();
        let err = update_confirmation_status(
            &store,
            rfc.id,
            link.id,
            ConfirmationStatus::Rejected,
            &executor,
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[test]
    fn test_stranger_is_forbidden_admin_is_not() {
        let store = InMemoryStorage::new();
        let executor = seed_user(&store, UserRole::Executor);
        let stranger = seed_user(&store, UserRole::Executor);
        let admin = seed_user(&store, UserRole::Admin);
        let (rfc, link) = seed_rfc_with_link(&store, &executor);

        let err = update_execution_status(
            &store,
            rfc.id,
            link.id,
            ExecutionStatus::InProgress,
            &stranger,
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let updated =
            update_execution_status(&store, rfc.id, link.id, ExecutionStatus::InProgress, &admin)
                .unwrap();
        assert_eq!(updated.execution_status, ExecutionStatus::InProgress);
    }

    #[test]
    fn test_execution_skip_is_rejected() {
        let store = InMemoryStorage::new();
        let executor = seed_user(&store, UserRole::Executor);
        let (rfc, link) = seed_rfc_with_link(&store, &executor);

        let err =
            update_execution_status(&store, rfc.id, link.id, ExecutionStatus::Done, &executor)
                .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);

        // No history is written for a rejected transition.
        assert!(store.status_record_list_by_links(&[link.id]).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_link_is_not_found() {
        let store = InMemoryStorage::new();
        let executor = seed_user(&store, UserRole::Executor);
        let (rfc, _link) = seed_rfc_with_link(&store, &executor);

        let err = update_confirmation_status(
            &store,
            rfc.id,
            new_entity_id(),
            ConfirmationStatus::Confirmed,
            &executor,
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::SubsystemNotFound);
    }
}
