//! Enum types for RFC workflow entities
//!
//! One canonical status vocabulary. The five-status RFC model is the one
//! consumed by the derivation job and the board integration; confirmation
//! and execution are the two independent axes on a subsystem link.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Aggregate status of an RFC.
///
/// `Implemented` and `Rejected` are terminal: the periodic derivation job
/// must never overwrite them. Only an explicit human board move or an
/// administrative action may change a terminal RFC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RfcStatus {
    New,
    UnderReview,
    Approved,
    Implemented,
    Rejected,
}

impl RfcStatus {
    /// Terminal statuses are owned by humans, not by the scheduler.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RfcStatus::Implemented | RfcStatus::Rejected)
    }

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            RfcStatus::New => "NEW",
            RfcStatus::UnderReview => "UNDER_REVIEW",
            RfcStatus::Approved => "APPROVED",
            RfcStatus::Implemented => "IMPLEMENTED",
            RfcStatus::Rejected => "REJECTED",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, ParseEnumError> {
        match s.to_uppercase().as_str() {
            "NEW" => Ok(RfcStatus::New),
            "UNDER_REVIEW" => Ok(RfcStatus::UnderReview),
            "APPROVED" => Ok(RfcStatus::Approved),
            "IMPLEMENTED" => Ok(RfcStatus::Implemented),
            "REJECTED" => Ok(RfcStatus::Rejected),
            _ => Err(ParseEnumError::new("RfcStatus", s)),
        }
    }
}

impl fmt::Display for RfcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for RfcStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Whether the executor acknowledges feasibility of the change for one
/// subsystem link. Leaves `Pending` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmationStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
}

impl ConfirmationStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ConfirmationStatus::Pending => "PENDING",
            ConfirmationStatus::Confirmed => "CONFIRMED",
            ConfirmationStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, ParseEnumError> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(ConfirmationStatus::Pending),
            "CONFIRMED" => Ok(ConfirmationStatus::Confirmed),
            "REJECTED" => Ok(ConfirmationStatus::Rejected),
            _ => Err(ParseEnumError::new("ConfirmationStatus", s)),
        }
    }
}

impl fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// Progress of actually carrying out the change for one subsystem link.
/// Strictly ordered; moves forward one stage at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    #[default]
    Pending,
    InProgress,
    Done,
}

impl ExecutionStatus {
    /// Ordering rank used by the transition validator.
    pub fn rank(&self) -> u8 {
        match self {
            ExecutionStatus::Pending => 0,
            ExecutionStatus::InProgress => 1,
            ExecutionStatus::Done => 2,
        }
    }

    pub fn as_db_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "PENDING",
            ExecutionStatus::InProgress => "IN_PROGRESS",
            ExecutionStatus::Done => "DONE",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, ParseEnumError> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(ExecutionStatus::Pending),
            "IN_PROGRESS" => Ok(ExecutionStatus::InProgress),
            "DONE" => Ok(ExecutionStatus::Done),
            _ => Err(ParseEnumError::new("ExecutionStatus", s)),
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// Urgency of an RFC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Emergency,
    Urgent,
    #[default]
    Planned,
}

impl Urgency {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Urgency::Emergency => "EMERGENCY",
            Urgency::Urgent => "URGENT",
            Urgency::Planned => "PLANNED",
        }
    }

    pub fn from_db_str(s: &str) -> Result<Self, ParseEnumError> {
        match s.to_uppercase().as_str() {
            "EMERGENCY" => Ok(Urgency::Emergency),
            "URGENT" => Ok(Urgency::Urgent),
            "PLANNED" => Ok(Urgency::Planned),
            _ => Err(ParseEnumError::new("Urgency", s)),
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// Role of a user in the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Requester,
    Executor,
    RfcApprover,
    CabManager,
    Admin,
}

impl UserRole {
    /// Whether this role may approve or unapprove an RFC as a whole.
    pub fn can_approve(&self) -> bool {
        matches!(
            self,
            UserRole::RfcApprover | UserRole::CabManager | UserRole::Admin
        )
    }
}

/// Which status axis a subsystem status-change record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusAxis {
    Confirmation,
    Execution,
}

impl StatusAxis {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            StatusAxis::Confirmation => "CONFIRMATION",
            StatusAxis::Execution => "EXECUTION",
        }
    }
}

impl fmt::Display for StatusAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// Operation that produced an RFC snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistoryOperation {
    Create,
    Update,
    StatusChange,
}

// ============================================================================
// PARSE ERRORS
// ============================================================================

/// Error when parsing an enum from its string representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {} value: {}", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc_status_terminal() {
        assert!(RfcStatus::Implemented.is_terminal());
        assert!(RfcStatus::Rejected.is_terminal());
        assert!(!RfcStatus::New.is_terminal());
        assert!(!RfcStatus::UnderReview.is_terminal());
        assert!(!RfcStatus::Approved.is_terminal());
    }

    #[test]
    fn test_rfc_status_db_round_trip() {
        for status in [
            RfcStatus::New,
            RfcStatus::UnderReview,
            RfcStatus::Approved,
            RfcStatus::Implemented,
            RfcStatus::Rejected,
        ] {
            assert_eq!(RfcStatus::from_db_str(status.as_db_str()), Ok(status));
        }
        assert!(RfcStatus::from_db_str("DRAFT").is_err());
    }

    #[test]
    fn test_rfc_status_serde_wire_form() {
        let json = serde_json::to_string(&RfcStatus::UnderReview).unwrap();
        assert_eq!(json, "\"UNDER_REVIEW\"");
        let parsed: RfcStatus = serde_json::from_str("\"IMPLEMENTED\"").unwrap();
        assert_eq!(parsed, RfcStatus::Implemented);
    }

    #[test]
    fn test_execution_status_rank_order() {
        assert!(ExecutionStatus::Pending.rank() < ExecutionStatus::InProgress.rank());
        assert!(ExecutionStatus::InProgress.rank() < ExecutionStatus::Done.rank());
    }

    #[test]
    fn test_urgency_parse_case_insensitive() {
        assert_eq!(Urgency::from_db_str("planned"), Ok(Urgency::Planned));
        assert_eq!(Urgency::from_db_str("EMERGENCY"), Ok(Urgency::Emergency));
        assert!(Urgency::from_db_str("whenever").is_err());
    }

    #[test]
    fn test_role_approval_rights() {
        assert!(UserRole::RfcApprover.can_approve());
        assert!(UserRole::CabManager.can_approve());
        assert!(UserRole::Admin.can_approve());
        assert!(!UserRole::Requester.can_approve());
        assert!(!UserRole::Executor.can_approve());
    }
}
