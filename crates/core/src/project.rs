//! Project lifecycle state machine.
//!
//! ```text
//! submit ──► EN_ATTENTE_ASSIGNATION ──assign──► EN_REVISION ──accept──► ACCEPTE
//!                                                   │  ▲                 │
//!                                             reject│  │resubmit         │ submit_final_report
//!                                                   ▼  │                 ▼
//!                                                  REFUSE          SOUMISSION_FINALE
//!                                                                   │  ▲
//!                                            defense validate/modify│  │defense report
//!                                                                   ▼  │
//!                                                          SOUTENANCE_PLANIFIEE ──evaluate──► EVALUE
//! ```
//!
//! Every transition is a pure function taking the current entity and
//! returning the next one, so the store can run it inside a single
//! read-modify-write and the client can run it as a local pre-check.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::academic::{self, AcademicYear};
use crate::error::CoreError;
use crate::roles::{Actor, Role};
use crate::types::{DbId, FileRef, Timestamp};
use crate::users::User;

const ENTITY: &str = "Project";

/// Upper bound on keywords attached to a proposal.
pub const MAX_KEYWORDS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[serde(rename = "EN_ATTENTE_ASSIGNATION")]
    PendingAssignment,
    #[serde(rename = "EN_REVISION")]
    UnderReview,
    #[serde(rename = "REFUSE")]
    Rejected,
    #[serde(rename = "ACCEPTE")]
    Accepted,
    #[serde(rename = "EN_COURS")]
    InProgress,
    #[serde(rename = "SOUMISSION_FINALE")]
    FinalSubmission,
    #[serde(rename = "SOUTENANCE_PLANIFIEE")]
    DefenseScheduled,
    #[serde(rename = "EVALUE")]
    Evaluated,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 8] = [
        ProjectStatus::PendingAssignment,
        ProjectStatus::UnderReview,
        ProjectStatus::Rejected,
        ProjectStatus::Accepted,
        ProjectStatus::InProgress,
        ProjectStatus::FinalSubmission,
        ProjectStatus::DefenseScheduled,
        ProjectStatus::Evaluated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::PendingAssignment => "EN_ATTENTE_ASSIGNATION",
            ProjectStatus::UnderReview => "EN_REVISION",
            ProjectStatus::Rejected => "REFUSE",
            ProjectStatus::Accepted => "ACCEPTE",
            ProjectStatus::InProgress => "EN_COURS",
            ProjectStatus::FinalSubmission => "SOUMISSION_FINALE",
            ProjectStatus::DefenseScheduled => "SOUTENANCE_PLANIFIEE",
            ProjectStatus::Evaluated => "EVALUE",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == value)
            .ok_or_else(|| CoreError::Validation(format!("Invalid project status '{value}'")))
    }

    /// Accepted projects take deliverables and the final report.
    pub fn is_active_phase(&self) -> bool {
        matches!(self, ProjectStatus::Accepted | ProjectStatus::InProgress)
    }

    /// Whether the project counts toward its professor's supervision load.
    pub fn occupies_supervisor(&self) -> bool {
        !matches!(self, ProjectStatus::Rejected | ProjectStatus::Evaluated)
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub objectives: String,
    pub context: Option<String>,
    pub methodology: Option<String>,
    pub expected_results: Option<String>,
    pub keywords: Vec<String>,
    pub status: ProjectStatus,
    pub student_id: DbId,
    /// Set only by `assign`.
    pub professor_id: Option<DbId>,
    pub proposal_file: Option<FileRef>,
    pub submitted_at: Timestamp,
    pub assigned_at: Option<Timestamp>,
    pub accepted_at: Option<Timestamp>,
    pub final_submitted_at: Option<Timestamp>,
    pub final_report: Option<FileRef>,
    pub professor_comments: Option<String>,
    /// Present exactly when `status == REFUSE`.
    pub rejection_reason: Option<String>,
    /// Bumped on every resubmission after a refusal.
    pub revision: u32,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSubmission {
    #[validate(length(min = 1, max = 300, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "objectives are required"))]
    pub objectives: String,
    pub context: Option<String>,
    pub methodology: Option<String>,
    pub expected_results: Option<String>,
    #[serde(default)]
    #[validate(length(max = 10, message = "at most 10 keywords"))]
    pub keywords: Vec<String>,
}

/// Optional field updates sent with a resubmission.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResubmission {
    #[validate(length(min = 1, max = 300, message = "title cannot be blank"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "description cannot be blank"))]
    pub description: Option<String>,
    #[validate(length(min = 1, message = "objectives cannot be blank"))]
    pub objectives: Option<String>,
    pub methodology: Option<String>,
    #[validate(length(max = 10, message = "at most 10 keywords"))]
    pub keywords: Option<Vec<String>>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentInput {
    pub professor_id: DbId,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDecision {
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionInput {
    pub reason: String,
    pub comments: Option<String>,
}

/// Supervisor feedback that keeps the project under review.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionRequest {
    #[serde(default)]
    pub comments: String,
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

fn ensure_status(
    project: &Project,
    action: &'static str,
    allowed: &[ProjectStatus],
) -> Result<(), CoreError> {
    if allowed.contains(&project.status) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity: ENTITY,
            action,
            status: project.status.to_string(),
        })
    }
}

/// The actor must be the professor assigned to `project`.
pub fn ensure_supervisor(project: &Project, actor: &Actor, action: &str) -> Result<(), CoreError> {
    actor.require(Role::Professor, action)?;
    if project.professor_id == Some(actor.user_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Professor {} does not supervise project {}",
            actor.user_id, project.id
        )))
    }
}

/// The actor must be the student who owns `project`.
pub fn ensure_owner(project: &Project, actor: &Actor, action: &str) -> Result<(), CoreError> {
    actor.require(Role::Student, action)?;
    if project.student_id == actor.user_id {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Student {} does not own project {}",
            actor.user_id, project.id
        )))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn clean_keywords(keywords: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for k in keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
        if !out.iter().any(|seen| seen.eq_ignore_ascii_case(k)) {
            out.push(k.to_string());
        }
    }
    out
}

/// `REFUSE` if and only if a rejection reason is recorded.
pub fn check_invariants(project: &Project) -> Result<(), CoreError> {
    let refused = project.status == ProjectStatus::Rejected;
    if refused != project.rejection_reason.is_some() {
        return Err(CoreError::Internal(format!(
            "project {} has status {} but rejection reason {:?}",
            project.id, project.status, project.rejection_reason
        )));
    }
    if project.status != ProjectStatus::PendingAssignment && project.professor_id.is_none() {
        return Err(CoreError::Internal(format!(
            "project {} left {} without a professor",
            project.id,
            ProjectStatus::PendingAssignment
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// A student creates their single project.
pub fn submit(
    id: DbId,
    actor: &Actor,
    input: &ProjectSubmission,
    existing: Option<&Project>,
    current_year: Option<&AcademicYear>,
    proposal_file: Option<FileRef>,
    now: Timestamp,
) -> Result<Project, CoreError> {
    actor.require(Role::Student, "submit a project")?;
    if let Some(existing) = existing {
        return Err(CoreError::Conflict(format!(
            "Student {} already has a project (id {})",
            actor.user_id, existing.id
        )));
    }
    input.validate()?;
    if input.title.trim().is_empty() {
        return Err(CoreError::field("title", "title is required"));
    }
    academic::ensure_submission_open(current_year, now.date_naive())?;

    Ok(Project {
        id,
        title: input.title.trim().to_string(),
        description: input.description.trim().to_string(),
        objectives: input.objectives.trim().to_string(),
        context: non_blank(input.context.as_deref()),
        methodology: non_blank(input.methodology.as_deref()),
        expected_results: non_blank(input.expected_results.as_deref()),
        keywords: clean_keywords(&input.keywords),
        status: ProjectStatus::PendingAssignment,
        student_id: actor.user_id,
        professor_id: None,
        proposal_file,
        submitted_at: now,
        assigned_at: None,
        accepted_at: None,
        final_submitted_at: None,
        final_report: None,
        professor_comments: None,
        rejection_reason: None,
        revision: 0,
        updated_at: now,
    })
}

/// Role and status half of [`assign`]; capacity needs the professor record.
pub fn ensure_assignable(project: &Project, actor: &Actor) -> Result<(), CoreError> {
    actor.require(Role::Admin, "assign a project")?;
    ensure_status(project, "assign", &[ProjectStatus::PendingAssignment])
}

/// An admin assigns a supervising professor with spare capacity.
pub fn assign(
    project: &Project,
    actor: &Actor,
    professor: &User,
    notes: Option<&str>,
    now: Timestamp,
) -> Result<Project, CoreError> {
    ensure_assignable(project, actor)?;

    let Some((current, max)) = professor.workload() else {
        return Err(CoreError::field(
            "professor_id",
            format!("User {} is not a professor", professor.id),
        ));
    };
    if !professor.is_active {
        return Err(CoreError::field(
            "professor_id",
            format!("Professor {} is inactive", professor.full_name()),
        ));
    }
    ensure_capacity(professor, current, max)?;

    let mut next = project.clone();
    next.professor_id = Some(professor.id);
    next.status = ProjectStatus::UnderReview;
    next.assigned_at = Some(now);
    if let Some(notes) = non_blank(notes) {
        next.professor_comments = Some(notes);
    }
    next.updated_at = now;
    Ok(next)
}

/// The supervising professor accepts the proposal.
pub fn accept(
    project: &Project,
    actor: &Actor,
    comments: Option<&str>,
    now: Timestamp,
) -> Result<Project, CoreError> {
    ensure_supervisor(project, actor, "accept a project")?;
    ensure_status(project, "accept", &[ProjectStatus::UnderReview])?;

    let mut next = project.clone();
    next.status = ProjectStatus::Accepted;
    next.accepted_at = Some(now);
    if let Some(comments) = non_blank(comments) {
        next.professor_comments = Some(comments);
    }
    next.updated_at = now;
    Ok(next)
}

/// The supervising professor refuses the proposal, citing a reason.
pub fn reject(
    project: &Project,
    actor: &Actor,
    reason: &str,
    comments: Option<&str>,
    now: Timestamp,
) -> Result<Project, CoreError> {
    ensure_supervisor(project, actor, "reject a project")?;
    ensure_status(project, "reject", &[ProjectStatus::UnderReview])?;
    let Some(reason) = non_blank(Some(reason)) else {
        return Err(CoreError::field("reason", "a rejection reason is required"));
    };

    let mut next = project.clone();
    next.status = ProjectStatus::Rejected;
    next.rejection_reason = Some(reason);
    if let Some(comments) = non_blank(comments) {
        next.professor_comments = Some(comments);
    }
    next.updated_at = now;
    Ok(next)
}

/// The supervising professor asks for changes without refusing: the
/// project stays under review with the professor's comments attached.
pub fn request_revision(
    project: &Project,
    actor: &Actor,
    comments: &str,
    now: Timestamp,
) -> Result<Project, CoreError> {
    ensure_supervisor(project, actor, "request a revision")?;
    ensure_status(project, "request a revision of", &[ProjectStatus::UnderReview])?;
    let Some(comments) = non_blank(Some(comments)) else {
        return Err(CoreError::field("comments", "revision comments are required"));
    };

    let mut next = project.clone();
    next.professor_comments = Some(comments);
    next.updated_at = now;
    Ok(next)
}

/// The owning student revises a refused project. The same entity goes back
/// to its professor for review with a bumped revision.
pub fn resubmit(
    project: &Project,
    actor: &Actor,
    update: &ProjectResubmission,
    now: Timestamp,
) -> Result<Project, CoreError> {
    ensure_owner(project, actor, "resubmit a project")?;
    ensure_status(project, "resubmit", &[ProjectStatus::Rejected])?;
    update.validate()?;

    let mut next = project.clone();
    if let Some(title) = non_blank(update.title.as_deref()) {
        next.title = title;
    }
    if let Some(description) = non_blank(update.description.as_deref()) {
        next.description = description;
    }
    if let Some(objectives) = non_blank(update.objectives.as_deref()) {
        next.objectives = objectives;
    }
    if let Some(methodology) = non_blank(update.methodology.as_deref()) {
        next.methodology = Some(methodology);
    }
    if let Some(keywords) = &update.keywords {
        next.keywords = clean_keywords(keywords);
    }
    next.status = ProjectStatus::UnderReview;
    next.rejection_reason = None;
    next.revision += 1;
    next.updated_at = now;
    Ok(next)
}

/// The owning student hands in the final report.
pub fn submit_final_report(
    project: &Project,
    actor: &Actor,
    report: FileRef,
    now: Timestamp,
) -> Result<Project, CoreError> {
    ensure_owner(project, actor, "submit a final report")?;
    ensure_status(
        project,
        "submit the final report for",
        &[ProjectStatus::Accepted, ProjectStatus::InProgress],
    )?;

    let mut next = project.clone();
    next.status = ProjectStatus::FinalSubmission;
    next.final_submitted_at = Some(now);
    next.final_report = Some(report);
    next.updated_at = now;
    Ok(next)
}

/// A refused project no longer counts toward its professor's load, so the
/// slot it takes back on resubmission must still be free.
pub fn ensure_resubmission_capacity(project: &Project, professor: &User) -> Result<(), CoreError> {
    if project.professor_id != Some(professor.id) {
        return Err(CoreError::Internal(format!(
            "Project {} is not supervised by user {}",
            project.id, professor.id
        )));
    }
    let Some((current, max)) = professor.workload() else {
        return Err(CoreError::Internal(format!(
            "Supervisor {} of project {} is not a professor",
            professor.id, project.id
        )));
    };
    ensure_capacity(professor, current, max)
}

fn ensure_capacity(professor: &User, current: u32, max: u32) -> Result<(), CoreError> {
    if current >= max {
        return Err(CoreError::Conflict(format!(
            "Professor {} has reached maximum capacity ({current}/{max})",
            professor.full_name()
        )));
    }
    Ok(())
}

/// Deliverables are only taken from the owner during the active phase.
pub fn ensure_accepts_deliverables(project: &Project, actor: &Actor) -> Result<(), CoreError> {
    ensure_owner(project, actor, "submit a deliverable")?;
    ensure_status(
        project,
        "submit a deliverable for",
        &[ProjectStatus::Accepted, ProjectStatus::InProgress],
    )
}

/// Professors propose a defense only once the final report is in.
pub fn ensure_ready_for_defense(project: &Project, actor: &Actor) -> Result<(), CoreError> {
    ensure_supervisor(project, actor, "propose a defense")?;
    ensure_status(project, "propose a defense for", &[ProjectStatus::FinalSubmission])
}

// Defense-driven transitions. The defense state machine has already checked
// the actor, so these only guard the project status.

pub fn mark_defense_scheduled(project: &Project, now: Timestamp) -> Result<Project, CoreError> {
    ensure_status(project, "schedule a defense for", &[ProjectStatus::FinalSubmission])?;
    let mut next = project.clone();
    next.status = ProjectStatus::DefenseScheduled;
    next.updated_at = now;
    Ok(next)
}

pub fn revert_to_final_submission(project: &Project, now: Timestamp) -> Result<Project, CoreError> {
    ensure_status(
        project,
        "postpone the defense of",
        &[ProjectStatus::FinalSubmission, ProjectStatus::DefenseScheduled],
    )?;
    let mut next = project.clone();
    next.status = ProjectStatus::FinalSubmission;
    next.updated_at = now;
    Ok(next)
}

pub fn mark_evaluated(project: &Project, now: Timestamp) -> Result<Project, CoreError> {
    ensure_status(project, "evaluate", &[ProjectStatus::DefenseScheduled])?;
    let mut next = project.clone();
    next.status = ProjectStatus::Evaluated;
    next.updated_at = now;
    Ok(next)
}
