//! Repository for `form_templates`.

use sqlx::PgPool;
use unicorr_core::types::DbId;

use crate::models::audit::NewAuditLog;
use crate::models::form_template::{CreateFormTemplate, FormTemplate, UpdateFormTemplate};
use crate::repositories::AuditLogRepo;

const COLUMNS: &str = "id, code, name, description, fields, allowed_roles, workflow_id, \
                       is_active, created_at, updated_at";

pub struct FormTemplateRepo;

impl FormTemplateRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateFormTemplate,
        audit: NewAuditLog,
    ) -> Result<FormTemplate, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "INSERT INTO form_templates (code, name, description, fields, allowed_roles, workflow_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let template = sqlx::query_as::<_, FormTemplate>(&query)
            .bind(input.code.trim().to_uppercase())
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(&input.fields)
            .bind(&input.allowed_roles)
            .bind(input.workflow_id)
            .fetch_one(&mut *tx)
            .await?;
        AuditLogRepo::append_in(
            &mut tx,
            NewAuditLog {
                entity_id: Some(template.id),
                ..audit
            },
        )
        .await?;
        tx.commit().await?;
        Ok(template)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<FormTemplate>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM form_templates WHERE id = $1");
        sqlx::query_as::<_, FormTemplate>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Active templates whose workflow is also active.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<FormTemplate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_templates
             WHERE is_active = true
               AND workflow_id IN (SELECT id FROM workflows WHERE is_active = true)
             ORDER BY name"
        );
        sqlx::query_as::<_, FormTemplate>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateFormTemplate,
        audit: NewAuditLog,
    ) -> Result<Option<FormTemplate>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "UPDATE form_templates SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                fields = COALESCE($4, fields),
                allowed_roles = COALESCE($5, allowed_roles),
                workflow_id = COALESCE($6, workflow_id),
                is_active = COALESCE($7, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, FormTemplate>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(&input.fields)
            .bind(&input.allowed_roles)
            .bind(input.workflow_id)
            .bind(input.is_active)
            .fetch_optional(&mut *tx)
            .await?;
        if updated.is_some() {
            AuditLogRepo::append_in(&mut tx, audit).await?;
        }
        tx.commit().await?;
        Ok(updated)
    }
}
