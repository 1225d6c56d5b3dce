//! Delegation of approval authority.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Longest window a single delegation may cover.
pub const MAX_DELEGATION_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationStatus {
    Pending,
    Approved,
    Rejected,
    Revoked,
}

impl DelegationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DelegationStatus::Pending => "pending",
            DelegationStatus::Approved => "approved",
            DelegationStatus::Rejected => "rejected",
            DelegationStatus::Revoked => "revoked",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(DelegationStatus::Pending),
            "approved" => Ok(DelegationStatus::Approved),
            "rejected" => Ok(DelegationStatus::Rejected),
            "revoked" => Ok(DelegationStatus::Revoked),
            other => Err(CoreError::Validation(format!(
                "Unknown delegation status '{other}'"
            ))),
        }
    }

    /// Statuses that reserve the grantor's window against overlaps.
    pub fn blocks_overlap(&self) -> bool {
        matches!(self, DelegationStatus::Pending | DelegationStatus::Approved)
    }
}

impl std::fmt::Display for DelegationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses checked by the overlap query.
pub const OVERLAP_BLOCKING_STATUSES: &[&str] = &["pending", "approved"];

/// Validate a requested delegation before it is stored.
pub fn validate_new(
    grantor_id: DbId,
    grantee_id: DbId,
    starts_at: Timestamp,
    ends_at: Timestamp,
    now: Timestamp,
) -> Result<(), CoreError> {
    if grantor_id == grantee_id {
        return Err(CoreError::Validation(
            "A user cannot delegate to themselves".to_string(),
        ));
    }
    if ends_at <= starts_at {
        return Err(CoreError::Validation(
            "ends_at must be after starts_at".to_string(),
        ));
    }
    if ends_at - starts_at > Duration::days(MAX_DELEGATION_DAYS) {
        return Err(CoreError::Validation(format!(
            "A delegation may not exceed {MAX_DELEGATION_DAYS} days"
        )));
    }
    if ends_at <= now {
        return Err(CoreError::Validation(
            "ends_at must be in the future".to_string(),
        ));
    }
    Ok(())
}

/// Half-open windows `[start, end)` overlap.
pub fn windows_overlap(
    a_start: Timestamp,
    a_end: Timestamp,
    b_start: Timestamp,
    b_end: Timestamp,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Approved and `starts_at <= now < ends_at`.
pub fn is_active_at(
    status: DelegationStatus,
    starts_at: Timestamp,
    ends_at: Timestamp,
    now: Timestamp,
) -> bool {
    status == DelegationStatus::Approved && starts_at <= now && now < ends_at
}

/// A requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationTransition {
    Approve,
    Reject,
    Revoke,
}

impl DelegationTransition {
    pub fn target(&self) -> DelegationStatus {
        match self {
            DelegationTransition::Approve => DelegationStatus::Approved,
            DelegationTransition::Reject => DelegationStatus::Rejected,
            DelegationTransition::Revoke => DelegationStatus::Revoked,
        }
    }
}

/// Check a transition from `current` and return the new status.
pub fn transition(
    current: DelegationStatus,
    requested: DelegationTransition,
) -> Result<DelegationStatus, CoreError> {
    let allowed = match requested {
        DelegationTransition::Approve | DelegationTransition::Reject => {
            current == DelegationStatus::Pending
        }
        DelegationTransition::Revoke => current.blocks_overlap(),
    };
    if !allowed {
        return Err(CoreError::Conflict(format!(
            "Cannot move a {current} delegation to {}",
            requested.target()
        )));
    }
    Ok(requested.target())
}
