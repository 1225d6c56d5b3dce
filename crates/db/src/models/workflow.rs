//! Workflow templates and their steps.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unicorr_core::authority::StepApprover;
use unicorr_core::types::{DbId, Timestamp};
use unicorr_core::workflow::StepDefinition;
use unicorr_core::workflow_engine::StepPosition;
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Workflow {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkflowStep {
    pub id: DbId,
    pub workflow_id: DbId,
    pub step_number: i32,
    pub name: String,
    pub approver_role: Option<String>,
    pub approver_user_id: Option<DbId>,
    pub sla_hours: i32,
    pub is_final: bool,
    pub escalation_role: Option<String>,
}

impl WorkflowStep {
    pub fn approver(&self) -> StepApprover<'_> {
        StepApprover {
            role: self.approver_role.as_deref(),
            user_id: self.approver_user_id,
        }
    }

    /// Position of this step within `steps` (ascending by step number).
    pub fn position_in(&self, steps: &[WorkflowStep]) -> StepPosition {
        StepPosition {
            step_number: self.step_number,
            is_final: self.is_final,
            next_step: steps
                .iter()
                .map(|s| s.step_number)
                .find(|n| *n > self.step_number),
        }
    }
}

/// A workflow with its ordered steps.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowDetail {
    #[serde(flatten)]
    pub workflow: Workflow,
    pub steps: Vec<WorkflowStep>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkflow {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceSteps {
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateWorkflow {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}
