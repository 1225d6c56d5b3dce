//! Requests submitted against a form template.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unicorr_core::error::CoreError;
use unicorr_core::request_status::RequestStatus;
use unicorr_core::types::{DbId, Timestamp};
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Request {
    pub id: DbId,
    pub reference_number: String,
    pub requester_id: DbId,
    pub form_template_id: DbId,
    pub workflow_id: DbId,
    pub current_step: i32,
    pub status: String,
    pub title: String,
    pub form_data: serde_json::Value,
    pub submitted_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Request {
    pub fn status(&self) -> Result<RequestStatus, CoreError> {
        RequestStatus::parse(&self.status)
    }
}

/// An in-flight request together with the SLA of the step it waits at.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WaitingRequest {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub request: Request,
    pub sla_hours: i32,
    pub step_entered_at: Timestamp,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitRequest {
    pub form_template_id: DbId,
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub form_data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct ResubmitRequest {
    pub form_data: serde_json::Value,
}

/// Values for inserting a request; the reference number is assigned in
/// the same transaction.
#[derive(Debug)]
pub struct NewRequest<'a> {
    pub requester_id: DbId,
    pub form_template_id: DbId,
    pub template_code: &'a str,
    pub workflow_id: DbId,
    pub first_step: i32,
    pub title: &'a str,
    pub form_data: &'a serde_json::Value,
}

/// Filters for listing a requester's own requests.
#[derive(Debug, Default, Deserialize)]
pub struct RequestListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
