//! Request lifecycle statuses and approval action kinds.
//!
//! Both are stored as lowercase text in the database (`requests.status`,
//! `request_actions.action`); the `CHECK` constraints in the migrations must
//! list exactly the strings returned by `as_str`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// RequestStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a submitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Submitted, awaiting the first decision.
    Pending,
    /// At least one step approved, awaiting the next decision.
    Processing,
    /// Final step approved. Terminal.
    Approved,
    /// Rejected at some step. Terminal.
    Rejected,
    /// Sent back to the requester for changes.
    Returned,
}

const VALID_STATUS_STRINGS: &[&str] = &["pending", "processing", "approved", "rejected", "returned"];

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Returned => "returned",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "returned" => Ok(Self::Returned),
            _ => Err(CoreError::Validation(format!(
                "Invalid request status '{s}'. Must be one of: {}",
                VALID_STATUS_STRINGS.join(", ")
            ))),
        }
    }

    /// Approved and rejected requests never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Whether an approver may record a decision in this status.
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// Statuses that pin the workflow definition (steps may not be replaced).
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Pending | Self::Processing | Self::Returned)
    }
}

/// Status strings of every in-flight status, for SQL `= ANY($n)` filters.
pub const IN_FLIGHT_STATUSES: &[&str] = &["pending", "processing", "returned"];

/// Status strings on which approvers may act, for SQL `= ANY($n)` filters.
pub const ACTIONABLE_STATUSES: &[&str] = &["pending", "processing"];

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// An entry in the append-only `request_actions` trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Approve,
    Reject,
    ApproveWithChanges,
    RejectWithChanges,
    /// Requester sent a returned request back into the chain.
    Resubmit,
}

const VALID_DECISION_STRINGS: &[&str] = &[
    "approve",
    "reject",
    "approve_with_changes",
    "reject_with_changes",
];

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::ApproveWithChanges => "approve_with_changes",
            Self::RejectWithChanges => "reject_with_changes",
            Self::Resubmit => "resubmit",
        }
    }

    /// Parse any stored action string, including `resubmit`.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "resubmit" => Ok(Self::Resubmit),
            other => Self::parse_decision(other),
        }
    }

    /// Parse an approver decision. `resubmit` is not a decision.
    pub fn parse_decision(s: &str) -> Result<Self, CoreError> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "approve_with_changes" => Ok(Self::ApproveWithChanges),
            "reject_with_changes" => Ok(Self::RejectWithChanges),
            _ => Err(CoreError::Validation(format!(
                "Invalid action '{s}'. Must be one of: {}",
                VALID_DECISION_STRINGS.join(", ")
            ))),
        }
    }

    /// Approver decisions (everything except resubmission).
    pub fn is_decision(&self) -> bool {
        !matches!(self, Self::Resubmit)
    }

    pub fn is_approval(&self) -> bool {
        matches!(self, Self::Approve | Self::ApproveWithChanges)
    }

    /// Decisions that must carry an explanatory comment.
    pub fn requires_comment(&self) -> bool {
        matches!(
            self,
            Self::Reject | Self::ApproveWithChanges | Self::RejectWithChanges
        )
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Consistency
// ---------------------------------------------------------------------------

/// Check that a request's status is one the most recent action can produce.
///
/// `last_action` is `None` for a request nobody has acted on yet.
pub fn status_matches_last_action(status: RequestStatus, last_action: Option<ActionKind>) -> bool {
    use RequestStatus::*;
    match last_action {
        None => status == Pending,
        Some(ActionKind::Approve | ActionKind::ApproveWithChanges) => {
            matches!(status, Processing | Approved)
        }
        Some(ActionKind::Reject) => status == Rejected,
        Some(ActionKind::RejectWithChanges) => status == Returned,
        Some(ActionKind::Resubmit) => matches!(status, Pending | Processing),
    }
}
