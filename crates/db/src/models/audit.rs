//! Audit log entries. Immutable once written.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use unicorr_core::audit::{CanonicalEntry, ChainLink};
use unicorr_core::types::{DbId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub details: serde_json::Value,
    pub integrity_hash: String,
    pub created_at: Timestamp,
}

impl AuditLog {
    pub fn to_chain_link(&self) -> ChainLink {
        let canonical = CanonicalEntry {
            action_type: &self.action_type,
            entity_type: &self.entity_type,
            entity_id: self.entity_id,
            actor_id: self.actor_id,
            details: &self.details,
            created_at: self.created_at,
        }
        .to_canonical_string();
        ChainLink {
            id: self.id,
            canonical,
            integrity_hash: self.integrity_hash.clone(),
        }
    }
}

/// An entry to append; details are redacted before hashing.
#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub action_type: &'static str,
    pub entity_type: &'static str,
    pub entity_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub actor_id: Option<DbId>,
    pub action_type: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<DbId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
