//! Repository for the `users` table.
//!
//! Reads join `roles` and `departments` so every [`User`] carries its role
//! name and college, which approval scoping needs.

use sqlx::PgPool;
use unicorr_core::types::DbId;

use crate::models::user::{CreateUser, UpdateUser, User};

const SELECT: &str = "SELECT u.id, u.full_name, u.email, u.phone, u.role_id, r.name AS role, \
                      u.department_id, d.college_id, u.whatsapp_opt_in, u.is_active, \
                      u.created_at, u.updated_at \
                      FROM users u \
                      JOIN roles r ON r.id = u.role_id \
                      LEFT JOIN departments d ON d.id = u.department_id";

pub struct UserRepo;

impl UserRepo {
    /// Insert a user with an already-resolved role id.
    pub async fn create(
        pool: &PgPool,
        input: &CreateUser,
        role_id: DbId,
    ) -> Result<User, sqlx::Error> {
        let id: DbId = sqlx::query_scalar(
            "INSERT INTO users (full_name, email, phone, role_id, department_id, whatsapp_opt_in)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id",
        )
        .bind(input.full_name.trim())
        .bind(input.email.trim().to_lowercase())
        .bind(&input.phone)
        .bind(role_id)
        .bind(input.department_id)
        .bind(input.whatsapp_opt_in)
        .fetch_one(pool)
        .await?;

        let query = format!("{SELECT} WHERE u.id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("{SELECT} WHERE u.id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_many(pool: &PgPool, ids: &[DbId]) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("{SELECT} WHERE u.id = ANY($1) ORDER BY u.id");
        sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("{SELECT} ORDER BY u.full_name, u.id LIMIT $1 OFFSET $2");
        sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Active users holding `role`, candidates for a role-based step.
    pub async fn list_active_by_role(pool: &PgPool, role: &str) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("{SELECT} WHERE r.name = $1 AND u.is_active = true ORDER BY u.id");
        sqlx::query_as::<_, User>(&query)
            .bind(role)
            .fetch_all(pool)
            .await
    }

    /// Apply the non-`None` fields of `input`. Returns `None` if no row matched.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
        role_id: Option<DbId>,
    ) -> Result<Option<User>, sqlx::Error> {
        let updated = sqlx::query(
            "UPDATE users SET
                full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                role_id = COALESCE($5, role_id),
                department_id = COALESCE($6, department_id),
                whatsapp_opt_in = COALESCE($7, whatsapp_opt_in),
                is_active = COALESCE($8, is_active)
             WHERE id = $1",
        )
        .bind(id)
        .bind(input.full_name.as_deref().map(str::trim))
        .bind(input.email.as_deref().map(|e| e.trim().to_lowercase()))
        .bind(&input.phone)
        .bind(role_id)
        .bind(input.department_id)
        .bind(input.whatsapp_opt_in)
        .bind(input.is_active)
        .execute(pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Self::find_by_id(pool, id).await
    }

    /// Soft-deactivate a user. Returns `true` if the row changed.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET is_active = false WHERE id = $1 AND is_active = true")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
