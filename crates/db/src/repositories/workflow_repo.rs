//! Repository for `workflows` and `workflow_steps`.

use sqlx::PgPool;
use unicorr_core::request_status::IN_FLIGHT_STATUSES;
use unicorr_core::types::DbId;
use unicorr_core::workflow::StepDefinition;

use crate::models::audit::NewAuditLog;
use crate::models::workflow::{CreateWorkflow, UpdateWorkflow, Workflow, WorkflowStep};
use crate::repositories::AuditLogRepo;

const COLUMNS: &str = "id, name, description, is_active, created_by, created_at, updated_at";

const STEP_COLUMNS: &str = "id, workflow_id, step_number, name, approver_role, \
                            approver_user_id, sla_hours, is_final, escalation_role";

/// Result of replacing a workflow's steps.
#[derive(Debug)]
pub enum ReplaceStepsOutcome {
    Replaced(Vec<WorkflowStep>),
    NotFound,
    /// Requests still travelling through the workflow.
    InFlight(i64),
}

pub struct WorkflowRepo;

impl WorkflowRepo {
    /// Insert a workflow and its (already validated) steps.
    pub async fn create(
        pool: &PgPool,
        input: &CreateWorkflow,
        created_by: DbId,
        audit: NewAuditLog,
    ) -> Result<(Workflow, Vec<WorkflowStep>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO workflows (name, description, created_by) VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let workflow = sqlx::query_as::<_, Workflow>(&query)
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        let steps = Self::insert_steps(&mut tx, workflow.id, &input.steps).await?;
        AuditLogRepo::append_in(
            &mut tx,
            NewAuditLog {
                entity_id: Some(workflow.id),
                ..audit
            },
        )
        .await?;

        tx.commit().await?;
        Ok((workflow, steps))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Workflow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workflows WHERE id = $1");
        sqlx::query_as::<_, Workflow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Workflow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workflows ORDER BY name");
        sqlx::query_as::<_, Workflow>(&query).fetch_all(pool).await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateWorkflow,
    ) -> Result<Option<Workflow>, sqlx::Error> {
        let query = format!(
            "UPDATE workflows SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_active = COALESCE($4, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Workflow>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Steps of a workflow in ascending order.
    pub async fn list_steps(
        pool: &PgPool,
        workflow_id: DbId,
    ) -> Result<Vec<WorkflowStep>, sqlx::Error> {
        let query = format!(
            "SELECT {STEP_COLUMNS} FROM workflow_steps WHERE workflow_id = $1 ORDER BY step_number"
        );
        sqlx::query_as::<_, WorkflowStep>(&query)
            .bind(workflow_id)
            .fetch_all(pool)
            .await
    }

    /// Replace every step of a workflow, unless requests are in flight.
    ///
    /// The workflow row is locked `FOR UPDATE`; submissions take a share lock
    /// on it, so no request can enter the workflow while steps change.
    pub async fn replace_steps(
        pool: &PgPool,
        workflow_id: DbId,
        steps: &[StepDefinition],
        audit: NewAuditLog,
    ) -> Result<ReplaceStepsOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM workflows WHERE id = $1 FOR UPDATE")
                .bind(workflow_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(ReplaceStepsOutcome::NotFound);
        }

        let in_flight: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM requests WHERE workflow_id = $1 AND status = ANY($2)",
        )
        .bind(workflow_id)
        .bind(IN_FLIGHT_STATUSES)
        .fetch_one(&mut *tx)
        .await?;
        if in_flight > 0 {
            return Ok(ReplaceStepsOutcome::InFlight(in_flight));
        }

        sqlx::query("DELETE FROM workflow_steps WHERE workflow_id = $1")
            .bind(workflow_id)
            .execute(&mut *tx)
            .await?;
        let inserted = Self::insert_steps(&mut tx, workflow_id, steps).await?;
        AuditLogRepo::append_in(&mut tx, audit).await?;

        tx.commit().await?;
        Ok(ReplaceStepsOutcome::Replaced(inserted))
    }

    async fn insert_steps(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        workflow_id: DbId,
        steps: &[StepDefinition],
    ) -> Result<Vec<WorkflowStep>, sqlx::Error> {
        let query = format!(
            "INSERT INTO workflow_steps
                (workflow_id, step_number, name, approver_role, approver_user_id,
                 sla_hours, is_final, escalation_role)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {STEP_COLUMNS}"
        );
        let mut inserted = Vec::with_capacity(steps.len());
        for step in steps {
            let row = sqlx::query_as::<_, WorkflowStep>(&query)
                .bind(workflow_id)
                .bind(step.step_number)
                .bind(step.name.trim())
                .bind(&step.approver_role)
                .bind(step.approver_user_id)
                .bind(step.sla_hours)
                .bind(step.is_final)
                .bind(&step.escalation_role)
                .fetch_one(&mut **tx)
                .await?;
            inserted.push(row);
        }
        Ok(inserted)
    }
}
