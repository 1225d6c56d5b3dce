//! Who may act on a workflow step.
//!
//! A step names either a specific approver user or an approver role. Scoped
//! roles (department head, dean) only reach requests from their own
//! department or college. A user may also act on behalf of a grantor whose
//! delegation to them is active.

use serde::Serialize;

use crate::error::CoreError;
use crate::roles::{scope_of, RoleScope};
use crate::types::DbId;

/// The approver a workflow step calls for.
#[derive(Debug, Clone, Copy)]
pub struct StepApprover<'a> {
    pub role: Option<&'a str>,
    pub user_id: Option<DbId>,
}

/// A user's position in the organisation, as far as approvals care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgMember {
    pub user_id: DbId,
    pub role: String,
    pub department_id: Option<DbId>,
    pub college_id: Option<DbId>,
    pub is_active: bool,
}

/// How an actor came to be allowed to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Authority {
    /// The actor is the step's approver.
    Direct,
    /// The actor holds an active delegation from `grantor_id`.
    Delegated { grantor_id: DbId },
}

impl Authority {
    /// The user the action is recorded on behalf of, if delegated.
    pub fn on_behalf_of(&self) -> Option<DbId> {
        match self {
            Authority::Direct => None,
            Authority::Delegated { grantor_id } => Some(*grantor_id),
        }
    }
}

/// Whether `member` is the approver the step calls for, for this requester.
pub fn is_step_approver(step: &StepApprover<'_>, member: &OrgMember, requester: &OrgMember) -> bool {
    if !member.is_active {
        return false;
    }
    if let Some(user_id) = step.user_id {
        return member.user_id == user_id;
    }
    let Some(role) = step.role else {
        return false;
    };
    if member.role != role {
        return false;
    }
    match scope_of(role) {
        RoleScope::Global => true,
        RoleScope::Department => same_unit(member.department_id, requester.department_id),
        RoleScope::College => same_unit(member.college_id, requester.college_id),
    }
}

fn same_unit(a: Option<DbId>, b: Option<DbId>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

/// Resolve the authority under which `actor` may act on the step.
///
/// `grantors` are the users whose delegation to `actor` is active right now.
/// Direct authority takes precedence; delegation is not transitive.
pub fn resolve(
    step: &StepApprover<'_>,
    actor: &OrgMember,
    requester: &OrgMember,
    grantors: &[OrgMember],
) -> Result<Authority, CoreError> {
    if !actor.is_active {
        return Err(CoreError::Forbidden("Account is deactivated".into()));
    }
    if actor.user_id == requester.user_id {
        return Err(CoreError::Forbidden(
            "You cannot act on your own request".into(),
        ));
    }
    if is_step_approver(step, actor, requester) {
        return Ok(Authority::Direct);
    }
    grantors
        .iter()
        .find(|g| g.user_id != requester.user_id && is_step_approver(step, g, requester))
        .map(|g| Authority::Delegated {
            grantor_id: g.user_id,
        })
        .ok_or_else(|| {
            CoreError::Forbidden("You are not the approver for the current step".into())
        })
}
