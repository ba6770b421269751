//! RFC Core - Domain Types and Workflow Rules
//!
//! Pure domain layer for the RFC lifecycle engine: entity structures, the
//! canonical status enums, the subsystem state machines, the status
//! derivation function, and the snapshot-diff history reconstruction.
//! No I/O lives here - the storage and HTTP layers build on top.

pub mod entities;
pub mod enums;
pub mod error;
pub mod history;
pub mod identity;
pub mod status;
pub mod transitions;

pub use entities::{
    AffectedSubsystem, Approval, Attachment, Rfc, RfcSnapshot, StatusChangeRecord, Subsystem,
    System, User,
};
pub use enums::{
    ConfirmationStatus, ExecutionStatus, HistoryOperation, ParseEnumError, RfcStatus, StatusAxis,
    Urgency, UserRole,
};
pub use error::{
    AccessError, EntityKind, RfcError, RfcResult, StorageError, TransitionError, ValidationError,
};
pub use history::{
    paginate, reconstruct_events, ActorInfo, AttachmentInfo, FieldChange, HistoryContext,
    HistoryEvent, HistoryEventKind, SubsystemInfo,
};
pub use identity::{new_entity_id, EntityId, Timestamp};
pub use status::derive_status;
pub use transitions::{validate_confirmation_transition, validate_execution_transition};
