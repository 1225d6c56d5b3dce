//! SLA compliance reporting.

use std::collections::{BTreeMap, HashMap};

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use unicorr_core::error::CoreError;
use unicorr_core::request_status::ActionKind;
use unicorr_core::sla::{self, ActionPoint, StepSummary};
use unicorr_core::types::DbId;
use unicorr_db::models::request_action::ReportAction;
use unicorr_db::repositories::{RequestActionRepo, WorkflowRepo};

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::query::SlaReportParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Per-step compliance of one workflow.
#[derive(Debug, Serialize)]
pub struct WorkflowSlaReport {
    pub workflow_id: DbId,
    pub workflow_name: Option<String>,
    /// Requests with at least one recorded action.
    pub requests: usize,
    pub steps: Vec<StepSummary>,
}

/// Fold action rows into per-workflow step summaries.
///
/// Each request's actions are replayed on their own so the SLA clock restarts
/// at every step entry.
pub fn build_report(rows: &[ReportAction]) -> Result<Vec<WorkflowSlaReport>, CoreError> {
    let mut by_workflow: BTreeMap<DbId, BTreeMap<DbId, Vec<&ReportAction>>> = BTreeMap::new();
    for row in rows {
        by_workflow
            .entry(row.workflow_id)
            .or_default()
            .entry(row.request_id)
            .or_default()
            .push(row);
    }

    let mut reports = Vec::with_capacity(by_workflow.len());
    for (workflow_id, requests) in by_workflow {
        let mut samples = Vec::new();
        for actions in requests.values() {
            let Some(first) = actions.first() else {
                continue;
            };
            let hours: HashMap<i32, i32> = actions
                .iter()
                .filter_map(|a| a.sla_hours.map(|h| (a.step_number, h)))
                .collect();
            let points = actions
                .iter()
                .map(|a| {
                    Ok(ActionPoint {
                        step_number: a.step_number,
                        action: ActionKind::parse(&a.action)?,
                        acted_at: a.acted_at,
                    })
                })
                .collect::<Result<Vec<_>, CoreError>>()?;
            samples.extend(sla::evaluate_history(first.submitted_at, &points, |n| {
                hours.get(&n).copied()
            }));
        }
        reports.push(WorkflowSlaReport {
            workflow_id,
            workflow_name: None,
            requests: requests.len(),
            steps: sla::summarize(&samples),
        });
    }
    Ok(reports)
}

/// GET /api/v1/admin/reports/sla?workflow_id=&from=&to=
///
/// `from`/`to` bound the submission time of the requests considered.
pub async fn sla_report(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<SlaReportParams>,
) -> AppResult<impl IntoResponse> {
    let rows =
        RequestActionRepo::list_for_report(&state.pool, params.workflow_id, params.from, params.to)
            .await?;
    let mut reports = build_report(&rows)?;

    let names: HashMap<DbId, String> = WorkflowRepo::list(&state.pool)
        .await?
        .into_iter()
        .map(|w| (w.id, w.name))
        .collect();
    for report in &mut reports {
        report.workflow_name = names.get(&report.workflow_id).cloned();
    }

    Ok(Json(DataResponse { data: reports }))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use unicorr_core::types::Timestamp;

    use super::*;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
    }

    fn row(request_id: DbId, step: i32, action: &str, after_hours: i64) -> ReportAction {
        ReportAction {
            request_id,
            workflow_id: 1,
            submitted_at: t0(),
            step_number: step,
            action: action.to_string(),
            acted_at: t0() + Duration::hours(after_hours),
            sla_hours: Some(24),
        }
    }

    #[test]
    fn clock_restarts_at_each_step() {
        // Step 1 decided after 10h, step 2 decided 30h after entering it.
        let rows = vec![row(1, 1, "approve", 10), row(1, 2, "approve", 40)];
        let report = build_report(&rows).unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].requests, 1);
        let steps = &report[0].steps;
        assert_eq!(steps[0].step_number, 1);
        assert_eq!(steps[0].on_time, 1);
        assert_eq!(steps[1].step_number, 2);
        assert_eq!(steps[1].late, 1);
    }

    #[test]
    fn resubmission_is_not_a_sample_but_restarts_the_clock() {
        let rows = vec![
            row(2, 1, "reject_with_changes", 5),
            row(2, 1, "resubmit", 50),
            row(2, 1, "approve", 60),
        ];
        let report = build_report(&rows).unwrap();
        let step = &report[0].steps[0];
        assert_eq!(step.decided, 2);
        assert_eq!(step.on_time, 2);
    }

    #[test]
    fn workflows_are_reported_separately() {
        let mut other = row(3, 1, "reject", 30);
        other.workflow_id = 2;
        let report = build_report(&[row(1, 1, "approve", 1), other]).unwrap();
        assert_eq!(report.iter().map(|r| r.workflow_id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(report[1].steps[0].late, 1);
    }

    #[test]
    fn unknown_action_strings_are_an_error() {
        assert!(build_report(&[row(1, 1, "escalate", 1)]).is_err());
    }
}
