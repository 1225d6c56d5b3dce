//! User entity, DTOs and the organisational view used for approvals.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unicorr_core::authority::OrgMember;
use unicorr_core::types::{DbId, Timestamp};
use validator::Validate;

/// A user joined with role name and college, as returned by the API.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role_id: DbId,
    /// Resolved role name (e.g. `"dean"`).
    pub role: String,
    pub department_id: Option<DbId>,
    pub college_id: Option<DbId>,
    pub whatsapp_opt_in: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn to_org_member(&self) -> OrgMember {
        OrgMember {
            user_id: self.id,
            role: self.role.clone(),
            department_id: self.department_id,
            college_id: self.college_id,
            is_active: self.is_active,
        }
    }

    /// The phone number to message, when the user opted in to WhatsApp.
    pub fn whatsapp_phone(&self) -> Option<&str> {
        self.phone
            .as_deref()
            .filter(|p| self.whatsapp_opt_in && !p.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 20))]
    pub phone: Option<String>,
    /// Role name; must be one of the seeded roles.
    pub role: String,
    pub department_id: Option<DbId>,
    #[serde(default)]
    pub whatsapp_opt_in: bool,
}

/// Patch DTO. All fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 200))]
    pub full_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 20))]
    pub phone: Option<String>,
    pub role: Option<String>,
    pub department_id: Option<DbId>,
    pub whatsapp_opt_in: Option<bool>,
    pub is_active: Option<bool>,
}
