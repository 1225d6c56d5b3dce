//! Form templates: the field schema a request is submitted against.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unicorr_core::types::{DbId, Timestamp};
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FormTemplate {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    /// JSON array of `unicorr_core::forms::FormField`.
    pub fields: serde_json::Value,
    pub allowed_roles: Vec<String>,
    pub workflow_id: DbId,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFormTemplate {
    pub code: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub fields: serde_json::Value,
    #[serde(default)]
    pub allowed_roles: Vec<String>,
    pub workflow_id: DbId,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFormTemplate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub fields: Option<serde_json::Value>,
    pub allowed_roles: Option<Vec<String>>,
    pub workflow_id: Option<DbId>,
    pub is_active: Option<bool>,
}
