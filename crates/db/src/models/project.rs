//! Project rows and list filters.

use pfehub_core::project::{Project, ProjectStatus};
use pfehub_core::types::{DbId, FileRef, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::{to_u32, DbError, DbResult};

/// Column list for project queries.
pub const PROJECT_COLUMNS: &str = "id, title, description, objectives, context, methodology, \
    expected_results, keywords, status, student_id, professor_id, proposal_file, submitted_at, \
    assigned_at, accepted_at, final_submitted_at, final_report, professor_comments, \
    rejection_reason, revision, updated_at";

/// A row from the `projects` table.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub objectives: String,
    pub context: Option<String>,
    pub methodology: Option<String>,
    pub expected_results: Option<String>,
    pub keywords: Json<Vec<String>>,
    pub status: String,
    pub student_id: DbId,
    pub professor_id: Option<DbId>,
    pub proposal_file: Option<Json<FileRef>>,
    pub submitted_at: Timestamp,
    pub assigned_at: Option<Timestamp>,
    pub accepted_at: Option<Timestamp>,
    pub final_submitted_at: Option<Timestamp>,
    pub final_report: Option<Json<FileRef>>,
    pub professor_comments: Option<String>,
    pub rejection_reason: Option<String>,
    pub revision: i64,
    pub updated_at: Timestamp,
}

impl TryFrom<ProjectRow> for Project {
    type Error = DbError;

    fn try_from(row: ProjectRow) -> DbResult<Self> {
        let status =
            ProjectStatus::parse(&row.status).map_err(|e| DbError::corrupt("Project", row.id, e))?;
        Ok(Project {
            id: row.id,
            title: row.title,
            description: row.description,
            objectives: row.objectives,
            context: row.context,
            methodology: row.methodology,
            expected_results: row.expected_results,
            keywords: row.keywords.0,
            status,
            student_id: row.student_id,
            professor_id: row.professor_id,
            proposal_file: row.proposal_file.map(|j| j.0),
            submitted_at: row.submitted_at,
            assigned_at: row.assigned_at,
            accepted_at: row.accepted_at,
            final_submitted_at: row.final_submitted_at,
            final_report: row.final_report.map(|j| j.0),
            professor_comments: row.professor_comments,
            rejection_reason: row.rejection_reason,
            revision: to_u32("Project", row.id, row.revision)?,
            updated_at: row.updated_at,
        })
    }
}

/// Query filter for project listings. Unset fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub professor_id: Option<DbId>,
    pub student_id: Option<DbId>,
}

impl ProjectFilter {
    pub fn with_status(status: ProjectStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Project counts for the admin overview.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total: usize,
    /// Projects that still occupy their supervisor.
    pub active_projects: usize,
    /// Keyed by status wire name, every status present.
    pub by_status: std::collections::BTreeMap<String, usize>,
    /// Keyed by the student's department name.
    pub by_department: std::collections::BTreeMap<String, usize>,
}

/// Which file column of a project a stored path was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOwner {
    Proposal(DbId),
    FinalReport(DbId),
    Deliverable { project_id: DbId, deliverable_id: DbId },
}

impl FileOwner {
    pub fn project_id(&self) -> DbId {
        match *self {
            FileOwner::Proposal(id) | FileOwner::FinalReport(id) => id,
            FileOwner::Deliverable { project_id, .. } => project_id,
        }
    }
}
