//! Workflow template step definitions and chain validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::roles::is_known_role;
use crate::types::DbId;

/// Maximum number of steps in a single workflow.
pub const MAX_STEPS: usize = 20;

/// Upper bound for a step's SLA (30 days).
pub const MAX_SLA_HOURS: i32 = 720;

/// One step of a workflow as submitted by an administrator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StepDefinition {
    pub step_number: i32,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub approver_role: Option<String>,
    pub approver_user_id: Option<DbId>,
    #[validate(range(min = 1, max = 720))]
    pub sla_hours: i32,
    #[serde(default)]
    pub is_final: bool,
    pub escalation_role: Option<String>,
}

/// Validate a complete chain of steps.
///
/// Steps must be numbered `1..=n` in order, each must name an approver, and
/// exactly one step (the last) is final.
pub fn validate_chain(steps: &[StepDefinition]) -> Result<(), CoreError> {
    if steps.is_empty() {
        return Err(CoreError::Validation(
            "A workflow needs at least one step".to_string(),
        ));
    }
    if steps.len() > MAX_STEPS {
        return Err(CoreError::Validation(format!(
            "A workflow may have at most {MAX_STEPS} steps, got {}",
            steps.len()
        )));
    }

    for (idx, step) in steps.iter().enumerate() {
        let expected = idx as i32 + 1;
        if step.step_number != expected {
            return Err(CoreError::Validation(format!(
                "Steps must be numbered consecutively from 1; expected {expected}, got {}",
                step.step_number
            )));
        }
        step.validate()?;

        if step.approver_role.is_none() && step.approver_user_id.is_none() {
            return Err(CoreError::Validation(format!(
                "Step {expected} must name an approver role or an approver user"
            )));
        }
        for role in [&step.approver_role, &step.escalation_role].into_iter().flatten() {
            if !is_known_role(role) {
                return Err(CoreError::Validation(format!(
                    "Step {expected} references unknown role '{role}'"
                )));
            }
        }

        let is_last = idx + 1 == steps.len();
        if step.is_final != is_last {
            return Err(CoreError::Validation(
                "Exactly one step must be final and it must be the last step".to_string(),
            ));
        }
    }
    Ok(())
}

/// The step a request moves to after an approval at `current`.
///
/// `step_numbers` lists the workflow's step numbers in ascending order.
/// Returns `None` when `current` is the last step.
pub fn next_step_after(step_numbers: &[i32], current: i32) -> Option<i32> {
    step_numbers.iter().copied().find(|n| *n > current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn step(n: i32, role: &str, is_final: bool) -> StepDefinition {
        StepDefinition {
            step_number: n,
            name: format!("Step {n}"),
            approver_role: Some(role.to_string()),
            approver_user_id: None,
            sla_hours: 48,
            is_final,
            escalation_role: None,
        }
    }

    #[test]
    fn three_step_chain_is_valid() {
        let steps = vec![
            step(1, "department_head", false),
            step(2, "dean", false),
            step(3, "admin", true),
        ];
        assert!(validate_chain(&steps).is_ok());
    }

    #[test]
    fn empty_chain_rejected() {
        assert_matches!(validate_chain(&[]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn gap_in_numbering_rejected() {
        let steps = vec![step(1, "dean", false), step(3, "admin", true)];
        let err = validate_chain(&steps).unwrap_err();
        assert!(err.to_string().contains("expected 2"));
    }

    #[test]
    fn final_must_be_last() {
        let steps = vec![step(1, "dean", true), step(2, "admin", false)];
        assert_matches!(validate_chain(&steps), Err(CoreError::Validation(_)));

        let steps = vec![step(1, "dean", false), step(2, "admin", false)];
        assert_matches!(validate_chain(&steps), Err(CoreError::Validation(_)));
    }

    #[test]
    fn step_without_approver_rejected() {
        let mut s = step(1, "dean", true);
        s.approver_role = None;
        let err = validate_chain(&[s]).unwrap_err();
        assert!(err.to_string().contains("approver"));
    }

    #[test]
    fn specific_user_is_enough() {
        let mut s = step(1, "dean", true);
        s.approver_role = None;
        s.approver_user_id = Some(9);
        assert!(validate_chain(&[s]).is_ok());
    }

    #[test]
    fn unknown_role_rejected() {
        let steps = vec![step(1, "chancellor", true)];
        assert_matches!(validate_chain(&steps), Err(CoreError::Validation(_)));
    }

    #[test]
    fn sla_hours_bounds_enforced() {
        let mut s = step(1, "dean", true);
        s.sla_hours = 0;
        assert_matches!(validate_chain(&[s.clone()]), Err(CoreError::Validation(_)));
        s.sla_hours = MAX_SLA_HOURS + 1;
        assert_matches!(validate_chain(&[s]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn next_step_lookup() {
        assert_eq!(next_step_after(&[1, 2, 3], 1), Some(2));
        assert_eq!(next_step_after(&[1, 2, 3], 3), None);
    }
}
