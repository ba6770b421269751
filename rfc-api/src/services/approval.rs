//! Approval ledger
//!
//! One live record per (RFC, approver) pair, upserted on each
//! approve/unapprove action. Setting the same verdict twice is a no-op
//! apart from the refreshed update timestamp - never an error.

use crate::error::{ApiError, ApiResult};
use rfc_core::{new_entity_id, AccessError, Approval, EntityId, RfcError, User};
use rfc_storage::StorageTrait;

/// Upsert the caller's approval verdict for an RFC.
pub fn set_approval(
    store: &dyn StorageTrait,
    rfc_id: EntityId,
    current_user: &User,
    approved: bool,
    comment: Option<String>,
) -> ApiResult<Approval> {
    tracing::info!(%rfc_id, user_id = %current_user.id, approved, "Recording approval verdict");

    if !current_user.role.can_approve() {
        tracing::warn!(user_id = %current_user.id, "Approval denied by role check");
        return Err(RfcError::from(AccessError::ApprovalDenied {
            user_id: current_user.id,
        })
        .into());
    }

    if store.rfc_get(rfc_id)?.is_none() {
        return Err(ApiError::rfc_not_found(rfc_id));
    }

    let now = chrono::Utc::now();
    let approval = match store.approval_find(rfc_id, current_user.id)? {
        Some(mut existing) => {
            existing.approved = approved;
            existing.comment = comment;
            existing.updated_at = now;
            existing
        }
        None => Approval {
            id: new_entity_id(),
            rfc_id,
            approver_id: current_user.id,
            approved,
            comment,
            created_at: now,
            updated_at: now,
        },
    };

    store.approval_save(&approval)?;
    Ok(approval)
}

/// List all approval records for an RFC.
pub fn list_approvals(store: &dyn StorageTrait, rfc_id: EntityId) -> ApiResult<Vec<Approval>> {
    if store.rfc_get(rfc_id)?.is_none() {
        return Err(ApiError::rfc_not_found(rfc_id));
    }
    Ok(store.approval_list_by_rfc(rfc_id)?)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::Utc;
    use rfc_core::{Rfc, RfcStatus, Urgency, UserRole};
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

    fn seed_rfc(store: &InMemoryStorage) -> Rfc {
        let now = Utc::now();
        let rfc = Rfc {
            id: new_entity_id(),
            number: store.rfc_next_number(),
            title: "Upgrade database".to_string(),
            description: None,
            urgency: Urgency::Planned,
            status: RfcStatus::UnderReview,
            implementation_date: now,
            requester_id: new_entity_id(),
            board_card_id: None,
            board_status_changed_at: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        store.rfc_insert(&rfc).unwrap();
        rfc
    }

    #[test]
    fn test_approve_creates_single_record() {
        let store = InMemoryStorage::new();
        let approver = seed_user(&store, UserRole::RfcApprover);
        let rfc = seed_rfc(&store);

        let approval =
            set_approval(&store, rfc.id, &approver, true, Some("LGTM".to_string())).unwrap();
        assert!(approval.approved);
        assert_eq!(approval.comment.as_deref(), Some("LGTM"));

        let listed = list_approvals(&store, rfc.id).unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn test_set_approval_is_idempotent() {
        let store = InMemoryStorage::new();
        let approver = seed_user(&store, UserRole::CabManager);
        let rfc = seed_rfc(&store);

        let first = set_approval(&store, rfc.id, &approver, true, None).unwrap();
        let second = set_approval(&store, rfc.id, &approver, true, None).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(list_approvals(&store, rfc.id).unwrap().len(), 1);
    }

    #[test]
    fn test_unapprove_flips_existing_record() {
        let store = InMemoryStorage::new();
        let approver = seed_user(&store, UserRole::RfcApprover);
        let rfc = seed_rfc(&store);

        set_approval(&store, rfc.id, &approver, true, None).unwrap();
        let flipped =
            set_approval(&store, rfc.id, &approver, false, Some("changed my mind".to_string()))
                .unwrap();

        assert!(!flipped.approved);
        assert_eq!(list_approvals(&store, rfc.id).unwrap().len(), 1);
    }

    #[test]
    fn test_non_approver_roles_are_forbidden() {
        let store = InMemoryStorage::new();
        let requester = seed_user(&store, UserRole::Requester);
        let executor = seed_user(&store, UserRole::Executor);
        let rfc = seed_rfc(&store);

        for user in [&requester, &executor] {
            let err = set_approval(&store, rfc.id, user, true, None).unwrap_err();
            assert_eq!(err.code, ErrorCode::Forbidden);
        }
    }

    #[test]
    fn test_missing_rfc_is_not_found() {
        let store = InMemoryStorage::new();
        let approver = seed_user(&store, UserRole::Admin);

        let err = set_approval(&store, new_entity_id(), &approver, true, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::RfcNotFound);

        let err = list_approvals(&store, new_entity_id()).unwrap_err();
        assert_eq!(err.code, ErrorCode::RfcNotFound);
    }
}
