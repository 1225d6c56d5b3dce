//! Approval engine: computes the effect of an action on a request.
//!
//! The functions here are pure. The API layer loads the request and its
//! workflow step, asks for a [`Transition`], then persists it with a
//! compare-and-set on the `(status, current_step)` it was computed from.

use serde::Serialize;

use crate::error::CoreError;
use crate::request_status::{ActionKind, RequestStatus};

/// Maximum length of an action comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 2000;

/// The workflow step a request is currently sitting at.
#[derive(Debug, Clone, Copy)]
pub struct StepPosition {
    pub step_number: i32,
    pub is_final: bool,
    /// The next step number in the workflow, if any.
    pub next_step: Option<i32>,
}

/// The outcome of applying an action to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub action: ActionKind,
    pub from_status: RequestStatus,
    pub to_status: RequestStatus,
    pub from_step: i32,
    pub to_step: i32,
}

impl Transition {
    /// Whether the request moved on to a later step.
    pub fn advanced(&self) -> bool {
        self.to_step != self.from_step
    }
}

/// Normalize and validate an action comment.
///
/// Returns the trimmed comment (or `None` when blank). Decisions that require
/// an explanation fail with a validation error when the comment is blank.
pub fn normalize_comment(
    action: ActionKind,
    comment: Option<&str>,
) -> Result<Option<String>, CoreError> {
    let trimmed = comment.map(str::trim).filter(|c| !c.is_empty());

    if let Some(c) = trimmed {
        let len = c.chars().count();
        if len > MAX_COMMENT_CHARS {
            return Err(CoreError::Validation(format!(
                "Comment must be at most {MAX_COMMENT_CHARS} characters, got {len}"
            )));
        }
    }

    if trimmed.is_none() && action.requires_comment() {
        return Err(CoreError::Validation(format!(
            "A comment is required for '{action}'"
        )));
    }

    Ok(trimmed.map(str::to_string))
}

/// Compute the transition produced by an approver decision.
pub fn decide(
    status: RequestStatus,
    position: StepPosition,
    action: ActionKind,
) -> Result<Transition, CoreError> {
    if !action.is_decision() {
        return Err(not_a_decision(action));
    }
    if !status.is_actionable() {
        return Err(CoreError::Conflict(format!(
            "Request is {status} and cannot be acted on"
        )));
    }

    let from_step = position.step_number;
    let (to_status, to_step) = match action {
        ActionKind::Approve | ActionKind::ApproveWithChanges => {
            match (position.is_final, position.next_step) {
                (false, Some(next)) => (RequestStatus::Processing, next),
                _ => (RequestStatus::Approved, from_step),
            }
        }
        ActionKind::Reject => (RequestStatus::Rejected, from_step),
        ActionKind::RejectWithChanges => (RequestStatus::Returned, from_step),
        ActionKind::Resubmit => return Err(not_a_decision(action)),
    };

    Ok(Transition {
        action,
        from_status: status,
        to_status,
        from_step,
        to_step,
    })
}

fn not_a_decision(action: ActionKind) -> CoreError {
    CoreError::Validation(format!("'{action}' is not an approver decision"))
}

/// Compute the transition produced by the requester resubmitting.
///
/// The request resumes at the step that returned it.
pub fn resubmit(
    status: RequestStatus,
    current_step: i32,
    first_step: i32,
) -> Result<Transition, CoreError> {
    if status != RequestStatus::Returned {
        return Err(CoreError::Conflict(format!(
            "Only returned requests can be resubmitted; request is {status}"
        )));
    }

    let to_status = if current_step == first_step {
        RequestStatus::Pending
    } else {
        RequestStatus::Processing
    };

    Ok(Transition {
        action: ActionKind::Resubmit,
        from_status: status,
        to_status,
        from_step: current_step,
        to_step: current_step,
    })
}
