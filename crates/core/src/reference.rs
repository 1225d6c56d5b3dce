//! Human-readable request reference numbers.

use chrono::Datelike;

use crate::types::{DbId, Timestamp};

/// `{CODE}-{YYYY}-{id:06}`, e.g. `LEAVE-2026-000042`.
pub fn format_reference(template_code: &str, submitted_at: Timestamp, request_id: DbId) -> String {
    format!(
        "{}-{}-{:06}",
        template_code.to_uppercase(),
        submitted_at.year(),
        request_id
    )
}
