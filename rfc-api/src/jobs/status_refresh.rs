//! Status Derivation Background Task
//!
//! Periodically recomputes every non-terminal RFC's aggregate status from
//! its subsystem and approval state, persisting changes and moving the
//! bound board card best-effort. One RFC's failure never aborts the pass,
//! and terminal RFCs plus RFCs inside the board-edit debounce window are
//! left untouched.

use crate::config::StatusRefreshConfig;
use crate::state::AppState;
use rfc_core::{derive_status, Rfc, UserRole};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

// ============================================================================
// METRICS
// ============================================================================

/// Counters for the status refresh job.
#[derive(Debug, Default)]
pub struct StatusRefreshMetrics {
    /// Total derivation passes completed
    pub passes: AtomicU64,

    /// Total RFC status updates persisted
    pub statuses_updated: AtomicU64,

    /// Total board sync attempts that failed (local change kept)
    pub sync_failures: AtomicU64,

    /// Total per-RFC errors isolated during passes
    pub rfc_errors: AtomicU64,
}

impl StatusRefreshMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current snapshot of all counters.
    pub fn snapshot(&self) -> StatusRefreshSnapshot {
        StatusRefreshSnapshot {
            passes: self.passes.load(Ordering::Relaxed),
            statuses_updated: self.statuses_updated.load(Ordering::Relaxed),
            sync_failures: self.sync_failures.load(Ordering::Relaxed),
            rfc_errors: self.rfc_errors.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of refresh metrics at a point in time.
#[derive(Debug, Clone)]
pub struct StatusRefreshSnapshot {
    pub passes: u64,
    pub statuses_updated: u64,
    pub sync_failures: u64,
    pub rfc_errors: u64,
}

// ============================================================================
// BACKGROUND TASK
// ============================================================================

/// Run derivation passes until the shutdown signal flips.
pub async fn status_refresh_task(
    state: AppState,
    config: StatusRefreshConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Arc<StatusRefreshMetrics> {
    let metrics = Arc::new(StatusRefreshMetrics::new());

    let mut tick = interval(config.tick_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        tick_secs = config.tick_interval.as_secs(),
        debounce_secs = config.debounce_window.as_secs(),
        "Status refresh task started"
    );

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::info!("Status refresh task shutting down");
                    break;
                }
            }

            _ = tick.tick() => {
                run_pass(&state, &config, &metrics).await;
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        passes = snapshot.passes,
        statuses_updated = snapshot.statuses_updated,
        sync_failures = snapshot.sync_failures,
        rfc_errors = snapshot.rfc_errors,
        "Status refresh task completed"
    );

    metrics
}

/// One derivation pass over all non-deleted RFCs. Errors are isolated per
/// RFC so one bad row cannot starve the rest.
pub async fn run_pass(
    state: &AppState,
    config: &StatusRefreshConfig,
    metrics: &StatusRefreshMetrics,
) {
    metrics.passes.fetch_add(1, Ordering::Relaxed);
    tracing::debug!("Starting status derivation pass");

    let rfcs = match state.store.rfc_list_active() {
        Ok(rfcs) => rfcs,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list RFCs for derivation pass");
            return;
        }
    };

    for rfc in rfcs {
        if let Err(e) = refresh_one(state, config, metrics, &rfc).await {
            tracing::error!(error = %e, rfc_id = %rfc.id, "Error refreshing RFC status");
            metrics.rfc_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    tracing::debug!("Status derivation pass completed");
}

async fn refresh_one(
    state: &AppState,
    config: &StatusRefreshConfig,
    metrics: &StatusRefreshMetrics,
    rfc: &Rfc,
) -> rfc_core::RfcResult<()> {
    // Terminal statuses belong to humans.
    if rfc.status.is_terminal() {
        tracing::debug!(rfc_id = %rfc.id, status = %rfc.status, "Skipping terminal RFC");
        return Ok(());
    }

    // Leave a recent human board edit alone.
    if let Some(stamp) = rfc.board_status_changed_at {
        let debounce = chrono::Duration::from_std(config.debounce_window)
            .unwrap_or_else(|_| chrono::Duration::seconds(300));
        if chrono::Utc::now() - stamp < debounce {
            tracing::debug!(rfc_id = %rfc.id, "Skipping RFC inside board-edit debounce window");
            return Ok(());
        }
    }

    let subsystems = state.store.link_list_by_rfc(rfc.id)?;
    let approvals = state.store.approval_list_by_rfc(rfc.id)?;
    let approver_ids: Vec<_> = state
        .store
        .user_list_by_role(UserRole::RfcApprover)?
        .into_iter()
        .map(|u| u.id)
        .collect();

    let new_status = derive_status(rfc.status, &subsystems, &approvals, &approver_ids);
    if new_status == rfc.status {
        return Ok(());
    }

    tracing::info!(
        rfc_id = %rfc.id,
        old_status = %rfc.status,
        new_status = %new_status,
        "Updating RFC status"
    );

    let mut updated = rfc.clone();
    updated.status = new_status;
    updated.updated_at = chrono::Utc::now();
    state.store.record_rfc_change(&updated, None)?;
    metrics.statuses_updated.fetch_add(1, Ordering::Relaxed);

    // Board sync is best-effort; the local change stands either way.
    if state.board.enabled() && updated.board_card_id.is_some() {
        if state.board.move_card_for_status(&updated).await {
            tracing::info!(rfc_id = %updated.id, status = %new_status, "Board card moved to status list");
        } else {
            tracing::warn!(rfc_id = %updated.id, status = %new_status, "Failed to sync RFC status to board");
            metrics.sync_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardGateway;
    use crate::config::BoardConfig;
    use chrono::Utc;
    use rfc_core::{
        new_entity_id, AffectedSubsystem, Approval, ConfirmationStatus, ExecutionStatus,
        RfcStatus, Urgency, User,
    };
    use rfc_storage::{InMemoryStorage, StorageTrait};
    use std::sync::Arc;

    fn test_state() -> (AppState, Arc<InMemoryStorage>) {
        let store = Arc::new(InMemoryStorage::new());
        let board = Arc::new(BoardGateway::new(BoardConfig::default()).unwrap());
        (AppState::new(store.clone(), board), store)
    }

    fn seed_rfc(store: &InMemoryStorage, status: RfcStatus) -> Rfc {
        let now = Utc::now();
        let rfc = Rfc {
            id: new_entity_id(),
            number: store.rfc_next_number(),
            title: "Tune GC settings".to_string(),
            description: None,
            urgency: Urgency::Planned,
            status,
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

    fn seed_link(
        store: &InMemoryStorage,
        rfc_id: rfc_core::EntityId,
        confirmation: ConfirmationStatus,
        execution: ExecutionStatus,
    ) -> AffectedSubsystem {
        let now = Utc::now();
        let link = AffectedSubsystem {
            id: new_entity_id(),
            rfc_id,
            subsystem_id: new_entity_id(),
            executor_id: new_entity_id(),
            confirmation_status: confirmation,
            execution_status: execution,
            created_at: now,
            updated_at: now,
        };
        store.link_insert(&link).unwrap();
        link
    }

    fn seed_approver(store: &InMemoryStorage) -> User {
        let user = User {
            id: new_entity_id(),
            username: format!("user-{}", new_entity_id()),
            full_name: "Approver".to_string(),
            email: format!("{}@example.com", new_entity_id()),
            role: UserRole::RfcApprover,
            board_user_id: None,
        };
        store.user_insert(&user).unwrap();
        user
    }

    fn seed_approval(store: &InMemoryStorage, rfc_id: rfc_core::EntityId, approver: &User) {
        let now = Utc::now();
        store
            .approval_save(&Approval {
                id: new_entity_id(),
                rfc_id,
                approver_id: approver.id,
                approved: true,
                comment: None,
                created_at: now,
                updated_at: now,
            })
            .unwrap();
    }

    async fn one_pass(state: &AppState) -> StatusRefreshSnapshot {
        let metrics = StatusRefreshMetrics::new();
        run_pass(state, &StatusRefreshConfig::default(), &metrics).await;
        metrics.snapshot()
    }

    #[tokio::test]
    async fn test_pending_confirmation_derives_new() {
        let (state, store) = test_state();
        let rfc = seed_rfc(&store, RfcStatus::UnderReview);
        seed_link(&store, rfc.id, ConfirmationStatus::Pending, ExecutionStatus::Pending);

        one_pass(&state).await;

        assert_eq!(store.rfc_get(rfc.id).unwrap().unwrap().status, RfcStatus::New);
    }

    #[tokio::test]
    async fn test_rejected_confirmation_derives_rejected() {
        let (state, store) = test_state();
        let rfc = seed_rfc(&store, RfcStatus::New);
        seed_link(&store, rfc.id, ConfirmationStatus::Rejected, ExecutionStatus::Pending);

        one_pass(&state).await;

        assert_eq!(
            store.rfc_get(rfc.id).unwrap().unwrap().status,
            RfcStatus::Rejected
        );
    }

    #[tokio::test]
    async fn test_confirmed_without_approvers_derives_under_review() {
        let (state, store) = test_state();
        let rfc = seed_rfc(&store, RfcStatus::New);
        seed_link(&store, rfc.id, ConfirmationStatus::Confirmed, ExecutionStatus::Done);

        one_pass(&state).await;

        assert_eq!(
            store.rfc_get(rfc.id).unwrap().unwrap().status,
            RfcStatus::UnderReview
        );
    }

    #[tokio::test]
    async fn test_fully_approved_and_done_reaches_implemented_and_stays() {
        let (state, store) = test_state();
        let rfc = seed_rfc(&store, RfcStatus::Approved);
        seed_link(&store, rfc.id, ConfirmationStatus::Confirmed, ExecutionStatus::Done);
        let approver = seed_approver(&store);
        seed_approval(&store, rfc.id, &approver);

        let first = one_pass(&state).await;
        assert_eq!(first.statuses_updated, 1);
        assert_eq!(
            store.rfc_get(rfc.id).unwrap().unwrap().status,
            RfcStatus::Implemented
        );

        // Terminal guard: further passes leave the RFC alone even though
        // its inputs still derive Implemented.
        let second = one_pass(&state).await;
        assert_eq!(second.statuses_updated, 0);
        assert_eq!(
            store.rfc_get(rfc.id).unwrap().unwrap().status,
            RfcStatus::Implemented
        );
    }

    #[tokio::test]
    async fn test_scheduler_never_reverts_human_rejection() {
        let (state, store) = test_state();
        // A human moved the card to a rejected list; inputs would derive
        // Approved, but the terminal guard wins.
        let rfc = seed_rfc(&store, RfcStatus::Rejected);
        seed_link(&store, rfc.id, ConfirmationStatus::Confirmed, ExecutionStatus::InProgress);
        let approver = seed_approver(&store);
        seed_approval(&store, rfc.id, &approver);

        one_pass(&state).await;

        assert_eq!(
            store.rfc_get(rfc.id).unwrap().unwrap().status,
            RfcStatus::Rejected
        );
    }

    #[tokio::test]
    async fn test_recent_board_edit_is_debounced() {
        let (state, store) = test_state();
        let rfc = seed_rfc(&store, RfcStatus::UnderReview);
        seed_link(&store, rfc.id, ConfirmationStatus::Pending, ExecutionStatus::Pending);
        store
            .rfc_update(
                rfc.id,
                rfc_storage::RfcUpdate {
                    board_status_changed_at: Some(Utc::now()),
                    ..rfc_storage::RfcUpdate::default()
                },
            )
            .unwrap();

        one_pass(&state).await;

        // Would derive New, but the fresh board edit holds it back.
        assert_eq!(
            store.rfc_get(rfc.id).unwrap().unwrap().status,
            RfcStatus::UnderReview
        );
    }

    #[tokio::test]
    async fn test_stale_board_edit_is_reconciled() {
        let (state, store) = test_state();
        let rfc = seed_rfc(&store, RfcStatus::UnderReview);
        seed_link(&store, rfc.id, ConfirmationStatus::Pending, ExecutionStatus::Pending);
        store
            .rfc_update(
                rfc.id,
                rfc_storage::RfcUpdate {
                    board_status_changed_at: Some(Utc::now() - chrono::Duration::hours(1)),
                    ..rfc_storage::RfcUpdate::default()
                },
            )
            .unwrap();

        one_pass(&state).await;

        assert_eq!(store.rfc_get(rfc.id).unwrap().unwrap().status, RfcStatus::New);
    }

    #[tokio::test]
    async fn test_deleted_rfcs_are_ignored() {
        let (state, store) = test_state();
        let rfc = seed_rfc(&store, RfcStatus::UnderReview);
        seed_link(&store, rfc.id, ConfirmationStatus::Pending, ExecutionStatus::Pending);
        store
            .rfc_update(
                rfc.id,
                rfc_storage::RfcUpdate {
                    deleted_at: Some(Utc::now()),
                    ..rfc_storage::RfcUpdate::default()
                },
            )
            .unwrap();

        let snapshot = one_pass(&state).await;
        assert_eq!(snapshot.statuses_updated, 0);
    }

    #[tokio::test]
    async fn test_task_shuts_down_on_signal() {
        let (state, _store) = test_state();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(status_refresh_task(
            state,
            StatusRefreshConfig {
                tick_interval: std::time::Duration::from_millis(10),
                ..StatusRefreshConfig::default()
            },
            shutdown_rx,
        ));

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        let metrics = handle.await.unwrap();
        assert!(metrics.snapshot().passes >= 1);
    }
}
