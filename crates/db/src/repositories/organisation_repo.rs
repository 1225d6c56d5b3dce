//! Repositories for `roles`, `colleges` and `departments`.

use sqlx::PgPool;
use unicorr_core::types::DbId;

use crate::models::organisation::{College, CreateCollege, CreateDepartment, Department, Role};

pub struct RoleRepo;

impl RoleRepo {
    pub async fn list(pool: &PgPool) -> Result<Vec<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles ORDER BY id")
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
    }
}

const COLLEGE_COLUMNS: &str = "id, name, created_at, updated_at";

pub struct CollegeRepo;

impl CollegeRepo {
    pub async fn create(pool: &PgPool, input: &CreateCollege) -> Result<College, sqlx::Error> {
        let query = format!("INSERT INTO colleges (name) VALUES ($1) RETURNING {COLLEGE_COLUMNS}");
        sqlx::query_as::<_, College>(&query)
            .bind(input.name.trim())
            .fetch_one(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<College>, sqlx::Error> {
        let query = format!("SELECT {COLLEGE_COLUMNS} FROM colleges ORDER BY name");
        sqlx::query_as::<_, College>(&query).fetch_all(pool).await
    }

    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM colleges WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}

const DEPARTMENT_COLUMNS: &str = "id, college_id, name, created_at, updated_at";

pub struct DepartmentRepo;

impl DepartmentRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateDepartment,
    ) -> Result<Department, sqlx::Error> {
        let query = format!(
            "INSERT INTO departments (college_id, name) VALUES ($1, $2)
             RETURNING {DEPARTMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(input.college_id)
            .bind(input.name.trim())
            .fetch_one(pool)
            .await
    }

    /// List departments, optionally restricted to one college.
    pub async fn list(
        pool: &PgPool,
        college_id: Option<DbId>,
    ) -> Result<Vec<Department>, sqlx::Error> {
        let query = format!(
            "SELECT {DEPARTMENT_COLUMNS} FROM departments
             WHERE ($1::BIGINT IS NULL OR college_id = $1)
             ORDER BY college_id, name"
        );
        sqlx::query_as::<_, Department>(&query)
            .bind(college_id)
            .fetch_all(pool)
            .await
    }

    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM departments WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}
