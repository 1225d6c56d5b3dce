//! Audit log vocabulary and the integrity hash chain.
//!
//! Every audit entry stores `integrity_hash = sha256(prev_hash | canonical)`
//! so a rewritten or deleted row breaks every hash after it.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::types::{DbId, Timestamp};

/// Action types recorded in `audit_logs.action_type`.
pub mod action_types {
    pub const REQUEST_SUBMIT: &str = "request_submit";
    pub const REQUEST_ACTION: &str = "request_action";
    pub const REQUEST_RESUBMIT: &str = "request_resubmit";
    pub const ATTACHMENT_UPLOAD: &str = "attachment_upload";
    pub const DELEGATION_CREATE: &str = "delegation_create";
    pub const DELEGATION_APPROVE: &str = "delegation_approve";
    pub const DELEGATION_REJECT: &str = "delegation_reject";
    pub const DELEGATION_REVOKE: &str = "delegation_revoke";
    pub const WORKFLOW_CHANGE: &str = "workflow_change";
    pub const FORM_CHANGE: &str = "form_change";
    pub const USER_CHANGE: &str = "user_change";
    pub const ORGANISATION_CHANGE: &str = "organisation_change";
}

/// Entity types recorded in `audit_logs.entity_type`.
pub mod entity_types {
    pub const REQUEST: &str = "request";
    pub const DELEGATION: &str = "delegation";
    pub const WORKFLOW: &str = "workflow";
    pub const FORM_TEMPLATE: &str = "form_template";
    pub const USER: &str = "user";
    pub const COLLEGE: &str = "college";
    pub const DEPARTMENT: &str = "department";
}

/// Seed standing in for the previous hash of the first entry.
const CHAIN_SEED: &str = "AUDIT_LOG_CHAIN_SEED_V1";

/// SHA-256 over the previous entry's hash (or the seed) and `entry_data`.
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    format!("{:x}", Sha256::digest(format!("{prev}|{entry_data}").as_bytes()))
}

/// The hashed content of one entry, in a fixed field order.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalEntry<'a> {
    pub action_type: &'a str,
    pub entity_type: &'a str,
    pub entity_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub details: &'a serde_json::Value,
    pub created_at: Timestamp,
}

impl CanonicalEntry<'_> {
    /// Serialized form fed into [`compute_integrity_hash`].
    ///
    /// Timestamps are rendered with microsecond precision, the resolution
    /// PostgreSQL stores, so a hash computed before the insert matches the
    /// one recomputed from the stored row.
    pub fn to_canonical_string(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.action_type,
            self.entity_type,
            self.entity_id.map(|v| v.to_string()).unwrap_or_default(),
            self.actor_id.map(|v| v.to_string()).unwrap_or_default(),
            self.details,
            self.created_at.format("%Y-%m-%dT%H:%M:%S%.6fZ"),
        )
    }
}

/// One stored link of the chain, as read back for verification.
#[derive(Debug, Clone)]
pub struct ChainLink {
    pub id: DbId,
    pub canonical: String,
    pub integrity_hash: String,
}

/// Result of walking the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainVerification {
    pub checked: usize,
    pub valid: bool,
    /// Id of the first entry whose stored hash does not match.
    pub first_broken_id: Option<DbId>,
}

/// Recompute every hash in id order, starting from the seed.
pub fn verify_chain(links: &[ChainLink]) -> ChainVerification {
    let mut prev: Option<&str> = None;
    for (checked, link) in links.iter().enumerate() {
        let expected = compute_integrity_hash(prev, &link.canonical);
        if expected != link.integrity_hash {
            return ChainVerification {
                checked,
                valid: false,
                first_broken_id: Some(link.id),
            };
        }
        prev = Some(&link.integrity_hash);
    }
    ChainVerification {
        checked: links.len(),
        valid: true,
        first_broken_id: None,
    }
}

/// Keys whose values never reach the audit log.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "authorization",
    "api_key",
    "phone",
];

/// Replace values under sensitive keys (case-insensitive substring match)
/// with `"[REDACTED]"`, recursing into nested objects and arrays.
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(key, val)| {
                    let lower = key.to_lowercase();
                    let val = if SENSITIVE_FIELDS.iter().any(|f| lower.contains(f)) {
                        serde_json::Value::String("[REDACTED]".to_string())
                    } else {
                        redact_sensitive_fields(val)
                    };
                    (key.clone(), val)
                })
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(redact_sensitive_fields).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn chain(entries: &[&str]) -> Vec<ChainLink> {
        let mut prev: Option<String> = None;
        entries
            .iter()
            .enumerate()
            .map(|(i, data)| {
                let hash = compute_integrity_hash(prev.as_deref(), data);
                prev = Some(hash.clone());
                ChainLink {
                    id: i as DbId + 1,
                    canonical: data.to_string(),
                    integrity_hash: hash,
                }
            })
            .collect()
    }

    #[test]
    fn hash_is_deterministic_and_chained() {
        let first = compute_integrity_hash(None, "a");
        assert_eq!(first.len(), 64);
        assert_eq!(first, compute_integrity_hash(None, "a"));
        assert_ne!(first, compute_integrity_hash(Some(&first), "a"));
    }

    #[test]
    fn intact_chain_verifies() {
        let links = chain(&["one", "two", "three"]);
        let result = verify_chain(&links);
        assert!(result.valid);
        assert_eq!(result.checked, 3);
        assert_eq!(result.first_broken_id, None);
    }

    #[test]
    fn tampered_entry_is_detected() {
        let mut links = chain(&["one", "two", "three"]);
        links[1].canonical = "TWO".to_string();
        let result = verify_chain(&links);
        assert!(!result.valid);
        assert_eq!(result.checked, 1);
        assert_eq!(result.first_broken_id, Some(2));
    }

    #[test]
    fn deleted_entry_is_detected() {
        let mut links = chain(&["one", "two", "three"]);
        links.remove(1);
        assert_eq!(verify_chain(&links).first_broken_id, Some(3));
    }

    #[test]
    fn empty_chain_is_valid() {
        assert!(verify_chain(&[]).valid);
    }

    #[test]
    fn canonical_string_is_stable() {
        let details = json!({"status": "approved"});
        let entry = CanonicalEntry {
            action_type: action_types::REQUEST_ACTION,
            entity_type: entity_types::REQUEST,
            entity_id: Some(7),
            actor_id: None,
            details: &details,
            created_at: chrono::Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0).unwrap(),
        };
        assert_eq!(
            entry.to_canonical_string(),
            r#"request_action|request|7||{"status":"approved"}|2026-03-02T08:30:00.000000Z"#
        );
    }

    #[test]
    fn redaction_is_recursive_and_case_insensitive() {
        let input = json!({
            "full_name": "Layla",
            "Phone": "+9647700000000",
            "nested": {"api_key": "k", "ok": 1},
            "list": [{"refresh_token": "t"}]
        });
        let out = redact_sensitive_fields(&input);
        assert_eq!(out["full_name"], "Layla");
        assert_eq!(out["Phone"], "[REDACTED]");
        assert_eq!(out["nested"]["api_key"], "[REDACTED]");
        assert_eq!(out["nested"]["ok"], 1);
        assert_eq!(out["list"][0]["refresh_token"], "[REDACTED]");
    }
}
