//! Repository for `delegations`.

use sqlx::PgPool;
use unicorr_core::delegation::{DelegationStatus, OVERLAP_BLOCKING_STATUSES};
use unicorr_core::types::{DbId, Timestamp};

use crate::models::audit::NewAuditLog;
use crate::models::delegation::{CreateDelegation, Delegation};
use crate::repositories::AuditLogRepo;

const COLUMNS: &str = "id, grantor_id, grantee_id, starts_at, ends_at, status, reason, \
                       reviewed_by, reviewed_at, created_at, updated_at";

/// Result of inserting a delegation.
#[derive(Debug)]
pub enum CreateDelegationOutcome {
    Created(Delegation),
    /// The grantor already holds a pending or approved delegation whose
    /// window overlaps; carries its id.
    Overlaps(DbId),
}

pub struct DelegationRepo;

impl DelegationRepo {
    /// Insert a pending delegation unless it overlaps another of the
    /// grantor's live delegations.
    ///
    /// The grantor's user row is locked for the duration of the check so two
    /// concurrent requests cannot both pass it.
    pub async fn create(
        pool: &PgPool,
        grantor_id: DbId,
        input: &CreateDelegation,
        audit: NewAuditLog,
    ) -> Result<CreateDelegationOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(grantor_id)
            .execute(&mut *tx)
            .await?;

        let overlapping: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM delegations
             WHERE grantor_id = $1 AND status = ANY($2)
               AND starts_at < $4 AND $3 < ends_at
             ORDER BY id LIMIT 1",
        )
        .bind(grantor_id)
        .bind(OVERLAP_BLOCKING_STATUSES)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(existing) = overlapping {
            return Ok(CreateDelegationOutcome::Overlaps(existing));
        }

        let query = format!(
            "INSERT INTO delegations (grantor_id, grantee_id, starts_at, ends_at, reason)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let delegation = sqlx::query_as::<_, Delegation>(&query)
            .bind(grantor_id)
            .bind(input.grantee_id)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(&input.reason)
            .fetch_one(&mut *tx)
            .await?;

        AuditLogRepo::append_in(
            &mut tx,
            NewAuditLog {
                entity_id: Some(delegation.id),
                ..audit
            },
        )
        .await?;

        tx.commit().await?;
        Ok(CreateDelegationOutcome::Created(delegation))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Delegation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM delegations WHERE id = $1");
        sqlx::query_as::<_, Delegation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Delegations where the user is grantor or grantee, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Delegation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM delegations
             WHERE grantor_id = $1 OR grantee_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Delegation>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Delegation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM delegations
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Delegation>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Move a delegation from `from` to `to`, recording the reviewer.
    ///
    /// Returns `None` if the row no longer holds `from`.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        from: DelegationStatus,
        to: DelegationStatus,
        reviewer_id: DbId,
        audit: NewAuditLog,
    ) -> Result<Option<Delegation>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let query = format!(
            "UPDATE delegations SET status = $3, reviewed_by = $4, reviewed_at = NOW()
             WHERE id = $1 AND status = $2
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Delegation>(&query)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(reviewer_id)
            .fetch_optional(&mut *tx)
            .await?;
        if updated.is_some() {
            AuditLogRepo::append_in(&mut tx, audit).await?;
            tx.commit().await?;
        }
        Ok(updated)
    }

    /// Grantors whose approved delegation to `grantee_id` covers `at`.
    pub async fn active_grantors(
        pool: &PgPool,
        grantee_id: DbId,
        at: Timestamp,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT grantor_id FROM delegations
             WHERE grantee_id = $1 AND status = 'approved'
               AND starts_at <= $2 AND $2 < ends_at
             ORDER BY grantor_id",
        )
        .bind(grantee_id)
        .bind(at)
        .fetch_all(pool)
        .await
    }

    /// Grantees currently standing in for any of `grantor_ids`.
    pub async fn active_grantees(
        pool: &PgPool,
        grantor_ids: &[DbId],
        at: Timestamp,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT grantee_id FROM delegations
             WHERE grantor_id = ANY($1) AND status = 'approved'
               AND starts_at <= $2 AND $2 < ends_at
             ORDER BY grantee_id",
        )
        .bind(grantor_ids)
        .bind(at)
        .fetch_all(pool)
        .await
    }
}
