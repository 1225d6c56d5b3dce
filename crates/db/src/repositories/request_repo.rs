//! Repository for `requests`.
//!
//! Status changes go through [`RequestRepo::apply_transition`], which updates
//! the row only if it still holds the status and step the transition was
//! computed from, and appends the matching action row in the same
//! transaction.

use chrono::SubsecRound;
use sqlx::PgPool;
use unicorr_core::reference::format_reference;
use unicorr_core::request_status::{RequestStatus, ACTIONABLE_STATUSES};
use unicorr_core::types::{DbId, Timestamp};
use unicorr_core::workflow_engine::Transition;

use crate::models::audit::NewAuditLog;
use crate::models::request::{NewRequest, Request, WaitingRequest};
use crate::models::request_action::{NewAction, RequestAction};
use crate::repositories::AuditLogRepo;

const COLUMNS: &str = "id, reference_number, requester_id, form_template_id, workflow_id, \
                       current_step, status, title, form_data, submitted_at, created_at, updated_at";

const R_COLUMNS: &str = "r.id, r.reference_number, r.requester_id, r.form_template_id, \
                         r.workflow_id, r.current_step, r.status, r.title, r.form_data, \
                         r.submitted_at, r.created_at, r.updated_at";

const ACTION_COLUMNS: &str =
    "id, request_id, actor_id, on_behalf_of, step_number, action, comment, acted_at";

/// Requests waiting at an approver step, with the step's SLA and entry time.
fn waiting_query(filter: &str) -> String {
    format!(
        "SELECT * FROM (
            SELECT {R_COLUMNS}, s.sla_hours,
                   COALESCE(
                       (SELECT MAX(a.acted_at) FROM request_actions a WHERE a.request_id = r.id),
                       r.submitted_at
                   ) AS step_entered_at
            FROM requests r
            JOIN workflow_steps s
              ON s.workflow_id = r.workflow_id AND s.step_number = r.current_step
            WHERE r.status = ANY($1)
         ) w
         {filter}
         ORDER BY w.step_entered_at ASC"
    )
}

pub struct RequestRepo;

impl RequestRepo {
    /// Insert a new request at the workflow's first step.
    ///
    /// The id is drawn first so the reference number can be written with the
    /// row. Returns `None` when the workflow is missing or inactive; the share
    /// lock on the workflow keeps its steps fixed until commit.
    pub async fn create(
        pool: &PgPool,
        input: &NewRequest<'_>,
        audit: NewAuditLog,
    ) -> Result<Option<Request>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM workflows WHERE id = $1 FOR SHARE")
                .bind(input.workflow_id)
                .fetch_optional(&mut *tx)
                .await?;
        if active != Some(true) {
            return Ok(None);
        }

        let id: DbId = sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('requests', 'id'))")
            .fetch_one(&mut *tx)
            .await?;
        let submitted_at = chrono::Utc::now().trunc_subsecs(6);
        let reference = format_reference(input.template_code, submitted_at, id);

        let query = format!(
            "INSERT INTO requests
                (id, reference_number, requester_id, form_template_id, workflow_id,
                 current_step, status, title, form_data, submitted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        let request = sqlx::query_as::<_, Request>(&query)
            .bind(id)
            .bind(&reference)
            .bind(input.requester_id)
            .bind(input.form_template_id)
            .bind(input.workflow_id)
            .bind(input.first_step)
            .bind(RequestStatus::Pending.as_str())
            .bind(input.title.trim())
            .bind(input.form_data)
            .bind(submitted_at)
            .fetch_one(&mut *tx)
            .await?;

        AuditLogRepo::append_in(
            &mut tx,
            NewAuditLog {
                entity_id: Some(request.id),
                ..audit
            },
        )
        .await?;

        tx.commit().await?;
        Ok(Some(request))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Request>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM requests WHERE id = $1");
        sqlx::query_as::<_, Request>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A requester's own requests, newest first.
    pub async fn list_for_requester(
        pool: &PgPool,
        requester_id: DbId,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Request>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM requests
             WHERE requester_id = $1 AND ($2::TEXT IS NULL OR status = $2)
             ORDER BY submitted_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Request>(&query)
            .bind(requester_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Actionable requests whose current step names one of `user_ids`, or
    /// (for role-based steps) one of `roles`.
    ///
    /// This is a coarse prefilter: department and college scoping is applied
    /// by the caller.
    pub async fn list_inbox_candidates(
        pool: &PgPool,
        exclude_requester: DbId,
        user_ids: &[DbId],
        roles: &[String],
    ) -> Result<Vec<WaitingRequest>, sqlx::Error> {
        let query = waiting_query(
            "WHERE w.requester_id <> $2
               AND EXISTS (
                   SELECT 1 FROM workflow_steps s
                   WHERE s.workflow_id = w.workflow_id
                     AND s.step_number = w.current_step
                     AND (s.approver_user_id = ANY($3)
                          OR (s.approver_user_id IS NULL AND s.approver_role = ANY($4)))
               )",
        );
        sqlx::query_as::<_, WaitingRequest>(&query)
            .bind(ACTIONABLE_STATUSES)
            .bind(exclude_requester)
            .bind(user_ids)
            .bind(roles)
            .fetch_all(pool)
            .await
    }

    /// Actionable requests whose current step deadline is before `now`.
    pub async fn list_overdue(
        pool: &PgPool,
        now: Timestamp,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WaitingRequest>, sqlx::Error> {
        let query = format!(
            "{} LIMIT $3 OFFSET $4",
            waiting_query("WHERE w.step_entered_at + make_interval(hours => w.sla_hours) < $2")
        );
        sqlx::query_as::<_, WaitingRequest>(&query)
            .bind(ACTIONABLE_STATUSES)
            .bind(now)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Persist a transition with compare-and-set on `(status, current_step)`.
    ///
    /// `form_data`, when given, replaces the stored data (resubmission).
    /// Returns `None` if the request changed since the transition was
    /// computed; nothing is written in that case.
    pub async fn apply_transition(
        pool: &PgPool,
        request_id: DbId,
        transition: &Transition,
        action: &NewAction<'_>,
        form_data: Option<&serde_json::Value>,
        audit: NewAuditLog,
    ) -> Result<Option<(Request, RequestAction)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE requests SET
                status = $2,
                current_step = $3,
                form_data = COALESCE($6, form_data)
             WHERE id = $1 AND status = $4 AND current_step = $5
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Request>(&query)
            .bind(request_id)
            .bind(transition.to_status.as_str())
            .bind(transition.to_step)
            .bind(transition.from_status.as_str())
            .bind(transition.from_step)
            .bind(form_data)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(request) = updated else {
            return Ok(None);
        };

        let query = format!(
            "INSERT INTO request_actions
                (request_id, actor_id, on_behalf_of, step_number, action, comment, acted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {ACTION_COLUMNS}"
        );
        let recorded = sqlx::query_as::<_, RequestAction>(&query)
            .bind(request_id)
            .bind(action.actor_id)
            .bind(action.on_behalf_of)
            .bind(transition.from_step)
            .bind(action.action.as_str())
            .bind(action.comment)
            .bind(action.acted_at.trunc_subsecs(6))
            .fetch_one(&mut *tx)
            .await?;

        AuditLogRepo::append_in(&mut tx, audit).await?;

        tx.commit().await?;
        Ok(Some((request, recorded)))
    }
}
