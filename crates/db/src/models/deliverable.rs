//! Deliverable rows.

use pfehub_core::deliverable::{Deliverable, DeliverableKind};
use pfehub_core::types::{DbId, FileRef, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::{DbError, DbResult};

pub const DELIVERABLE_COLUMNS: &str =
    "id, project_id, title, description, kind, file, submitted_at, notes";

/// A row from the `deliverables` table.
#[derive(Debug, Clone, FromRow)]
pub struct DeliverableRow {
    pub id: DbId,
    pub project_id: DbId,
    pub title: String,
    pub description: String,
    pub kind: String,
    pub file: Json<FileRef>,
    pub submitted_at: Timestamp,
    pub notes: Option<String>,
}

impl TryFrom<DeliverableRow> for Deliverable {
    type Error = DbError;

    fn try_from(row: DeliverableRow) -> DbResult<Self> {
        let kind = DeliverableKind::parse(&row.kind)
            .map_err(|e| DbError::corrupt("Deliverable", row.id, e))?;
        Ok(Deliverable {
            id: row.id,
            project_id: row.project_id,
            title: row.title,
            description: row.description,
            kind,
            file: row.file.0,
            submitted_at: row.submitted_at,
            notes: row.notes,
        })
    }
}
