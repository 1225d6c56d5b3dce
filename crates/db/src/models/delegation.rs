//! Delegations of approval authority.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unicorr_core::delegation::DelegationStatus;
use unicorr_core::error::CoreError;
use unicorr_core::types::{DbId, Timestamp};
use validator::Validate;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Delegation {
    pub id: DbId,
    pub grantor_id: DbId,
    pub grantee_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub status: String,
    pub reason: Option<String>,
    pub reviewed_by: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Delegation {
    pub fn status(&self) -> Result<DelegationStatus, CoreError> {
        DelegationStatus::parse(&self.status)
    }
}

/// Body of `POST /delegations`; the caller is the grantor.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDelegation {
    pub grantee_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DelegationListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
