//! Read side of `request_actions`. Rows are written by
//! [`RequestRepo::apply_transition`](crate::repositories::RequestRepo::apply_transition).

use sqlx::PgPool;
use unicorr_core::types::{DbId, Timestamp};

use crate::models::request_action::{ReportAction, RequestAction};

const COLUMNS: &str =
    "id, request_id, actor_id, on_behalf_of, step_number, action, comment, acted_at";

pub struct RequestActionRepo;

impl RequestActionRepo {
    /// A request's actions, oldest first.
    pub async fn list_for_request(
        pool: &PgPool,
        request_id: DbId,
    ) -> Result<Vec<RequestAction>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM request_actions WHERE request_id = $1 ORDER BY acted_at, id"
        );
        sqlx::query_as::<_, RequestAction>(&query)
            .bind(request_id)
            .fetch_all(pool)
            .await
    }

    /// Every action on requests submitted in `[from, to]`, joined with the SLA
    /// of the step it was taken at, ordered by request then time.
    pub async fn list_for_report(
        pool: &PgPool,
        workflow_id: Option<DbId>,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
    ) -> Result<Vec<ReportAction>, sqlx::Error> {
        sqlx::query_as::<_, ReportAction>(
            "SELECT a.request_id, r.workflow_id, r.submitted_at, a.step_number, a.action,
                    a.acted_at, s.sla_hours
             FROM request_actions a
             JOIN requests r ON r.id = a.request_id
             LEFT JOIN workflow_steps s
               ON s.workflow_id = r.workflow_id AND s.step_number = a.step_number
             WHERE ($1::BIGINT IS NULL OR r.workflow_id = $1)
               AND ($2::TIMESTAMPTZ IS NULL OR r.submitted_at >= $2)
               AND ($3::TIMESTAMPTZ IS NULL OR r.submitted_at <= $3)
             ORDER BY r.workflow_id, a.request_id, a.acted_at, a.id",
        )
        .bind(workflow_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }
}
