//! Query parameter types shared across handler modules.

use serde::Deserialize;
use unicorr_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use unicorr_core::types::{DbId, Timestamp};

/// `?limit=&offset=`, clamped to the allowed page size.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    pub fn limit(&self) -> i64 {
        clamp_limit(self.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        clamp_offset(self.offset)
    }
}

/// Filters for the SLA report.
#[derive(Debug, Default, Deserialize)]
pub struct SlaReportParams {
    pub workflow_id: Option<DbId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DepartmentListParams {
    pub college_id: Option<DbId>,
}
