//! Shared query parameter types for API handlers.

use chrono::NaiveDate;
use pfehub_core::types::DbId;
use serde::Deserialize;

/// `?date=&time=&room=&excludeId=` for the advisory slot conflict check.
///
/// Kept as strings so malformed values surface as field errors rather than
/// a bare query rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckParams {
    pub date: String,
    pub time: String,
    pub room: String,
    pub exclude_id: Option<DbId>,
}

/// `?departmentId=` filter for specialization listings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentParams {
    pub department_id: Option<DbId>,
}

/// `?from=YYYY-MM-DD`; defaults to today.
#[derive(Debug, Deserialize)]
pub struct UpcomingParams {
    pub from: Option<NaiveDate>,
}

/// `?limit=` override for the recommender.
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

/// `?startDate=&endDate=` (inclusive) for the defense calendar.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeParams {
    pub start_date: String,
    pub end_date: String,
}

/// `?q=` free-text project search.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// `?limit=` for the recent-projects feed.
#[derive(Debug, Deserialize)]
pub struct RecentParams {
    pub limit: Option<u32>,
}
