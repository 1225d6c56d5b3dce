//! Append-only record of every decision and resubmission.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unicorr_core::error::CoreError;
use unicorr_core::request_status::ActionKind;
use unicorr_core::sla::ActionPoint;
use unicorr_core::types::{DbId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RequestAction {
    pub id: DbId,
    pub request_id: DbId,
    pub actor_id: DbId,
    pub on_behalf_of: Option<DbId>,
    pub step_number: i32,
    pub action: String,
    pub comment: Option<String>,
    pub acted_at: Timestamp,
}

impl RequestAction {
    pub fn kind(&self) -> Result<ActionKind, CoreError> {
        ActionKind::parse(&self.action)
    }

    pub fn to_action_point(&self) -> Result<ActionPoint, CoreError> {
        Ok(ActionPoint {
            step_number: self.step_number,
            action: self.kind()?,
            acted_at: self.acted_at,
        })
    }
}

/// Body of `POST /requests/{id}/actions`.
#[derive(Debug, Deserialize)]
pub struct ActOnRequest {
    pub action: String,
    pub comment: Option<String>,
}

/// An action row to insert alongside a status change.
#[derive(Debug)]
pub struct NewAction<'a> {
    pub actor_id: DbId,
    pub on_behalf_of: Option<DbId>,
    pub action: ActionKind,
    pub comment: Option<&'a str>,
    /// Taken from the same clock as `requests.submitted_at`.
    pub acted_at: Timestamp,
}

/// One decision with the SLA configured for its step, for reporting.
#[derive(Debug, Clone, FromRow)]
pub struct ReportAction {
    pub request_id: DbId,
    pub workflow_id: DbId,
    pub submitted_at: Timestamp,
    pub step_number: i32,
    pub action: String,
    pub acted_at: Timestamp,
    pub sla_hours: Option<i32>,
}
