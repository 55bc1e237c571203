//! Intermediate deliverables attached to an accepted project.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::project::{self, Project};
use crate::roles::Actor;
use crate::types::{DbId, FileRef, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliverableKind {
    #[serde(rename = "RAPPORT_AVANCEMENT")]
    ProgressReport,
    #[serde(rename = "CODE")]
    Code,
    #[serde(rename = "DOCUMENTATION")]
    Documentation,
    #[serde(rename = "AUTRE")]
    Other,
}

impl DeliverableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliverableKind::ProgressReport => "RAPPORT_AVANCEMENT",
            DeliverableKind::Code => "CODE",
            DeliverableKind::Documentation => "DOCUMENTATION",
            DeliverableKind::Other => "AUTRE",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "RAPPORT_AVANCEMENT" => Ok(Self::ProgressReport),
            "CODE" => Ok(Self::Code),
            "DOCUMENTATION" => Ok(Self::Documentation),
            "AUTRE" => Ok(Self::Other),
            other => Err(CoreError::field(
                "kind",
                format!(
                    "Invalid deliverable kind '{other}'. Must be one of: \
                     RAPPORT_AVANCEMENT, CODE, DOCUMENTATION, AUTRE"
                ),
            )),
        }
    }
}

/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deliverable {
    pub id: DbId,
    pub project_id: DbId,
    pub title: String,
    pub description: String,
    pub kind: DeliverableKind,
    pub file: FileRef,
    pub submitted_at: Timestamp,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeliverableSubmission {
    pub project_id: DbId,
    #[validate(length(min = 1, max = 300, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    pub kind: DeliverableKind,
    pub notes: Option<String>,
}

/// Create a deliverable for `project`. Only the owning student may submit,
/// and only while the project accepts work.
pub fn submit(
    id: DbId,
    project: &Project,
    actor: &Actor,
    input: &DeliverableSubmission,
    file: FileRef,
    now: Timestamp,
) -> Result<Deliverable, CoreError> {
    input.validate()?;
    if input.project_id != project.id {
        return Err(CoreError::field(
            "project_id",
            format!("deliverable targets project {}, not {}", input.project_id, project.id),
        ));
    }
    project::ensure_accepts_deliverables(project, actor)?;

    Ok(Deliverable {
        id,
        project_id: project.id,
        title: input.title.trim().to_string(),
        description: input.description.trim().to_string(),
        kind: input.kind,
        file,
        submitted_at: now,
        notes: input.notes.clone().filter(|n| !n.trim().is_empty()),
    })
}
