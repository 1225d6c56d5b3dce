//! Repository for the hash-chained `audit_logs` table.

use chrono::SubsecRound;
use sqlx::PgPool;
use unicorr_core::audit::{compute_integrity_hash, redact_sensitive_fields, CanonicalEntry};
use unicorr_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

use crate::models::audit::{AuditLog, AuditQuery, NewAuditLog};

const COLUMNS: &str = "id, action_type, entity_type, entity_id, actor_id, details, \
                       integrity_hash, created_at";

/// Key for `pg_advisory_xact_lock` serializing appends to the chain.
const CHAIN_LOCK_KEY: i64 = 0x4155_4449_545f_4c4f;

pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append an entry in its own transaction.
    pub async fn append(pool: &PgPool, entry: NewAuditLog) -> Result<AuditLog, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let log = Self::append_in(&mut tx, entry).await?;
        tx.commit().await?;
        Ok(log)
    }

    /// Append an entry inside an existing transaction.
    ///
    /// Takes a transaction-scoped advisory lock before reading the last hash,
    /// so concurrent appends cannot fork the chain.
    pub async fn append_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        entry: NewAuditLog,
    ) -> Result<AuditLog, sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(CHAIN_LOCK_KEY)
            .execute(&mut **tx)
            .await?;

        let prev_hash: Option<String> =
            sqlx::query_scalar("SELECT integrity_hash FROM audit_logs ORDER BY id DESC LIMIT 1")
                .fetch_optional(&mut **tx)
                .await?;

        let details = redact_sensitive_fields(&entry.details);
        let created_at = chrono::Utc::now().trunc_subsecs(6);
        let canonical = CanonicalEntry {
            action_type: entry.action_type,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            actor_id: entry.actor_id,
            details: &details,
            created_at,
        }
        .to_canonical_string();
        let integrity_hash = compute_integrity_hash(prev_hash.as_deref(), &canonical);

        let query = format!(
            "INSERT INTO audit_logs
                (action_type, entity_type, entity_id, actor_id, details, integrity_hash, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let log = sqlx::query_as::<_, AuditLog>(&query)
            .bind(entry.action_type)
            .bind(entry.entity_type)
            .bind(entry.entity_id)
            .bind(entry.actor_id)
            .bind(&details)
            .bind(&integrity_hash)
            .bind(created_at)
            .fetch_one(&mut **tx)
            .await?;
        tracing::debug!(
            audit_id = log.id,
            action_type = %log.action_type,
            entity_id = ?log.entity_id,
            "Audit entry appended",
        );
        Ok(log)
    }

    /// Filtered, newest-first page of entries.
    pub async fn query(pool: &PgPool, params: &AuditQuery) -> Result<Vec<AuditLog>, sqlx::Error> {
        let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
        let offset = clamp_offset(params.offset);
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs
             WHERE ($1::BIGINT IS NULL OR actor_id = $1)
               AND ($2::TEXT IS NULL OR action_type = $2)
               AND ($3::TEXT IS NULL OR entity_type = $3)
               AND ($4::BIGINT IS NULL OR entity_id = $4)
               AND ($5::TIMESTAMPTZ IS NULL OR created_at >= $5)
               AND ($6::TIMESTAMPTZ IS NULL OR created_at <= $6)
             ORDER BY id DESC
             LIMIT $7 OFFSET $8"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(params.actor_id)
            .bind(&params.action_type)
            .bind(&params.entity_type)
            .bind(params.entity_id)
            .bind(params.from)
            .bind(params.to)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// The whole chain in id order, for verification.
    pub async fn fetch_chain(pool: &PgPool) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM audit_logs ORDER BY id ASC");
        sqlx::query_as::<_, AuditLog>(&query).fetch_all(pool).await
    }
}
