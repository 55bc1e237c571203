//! Handlers for the `/projects` resource: submission, review, assignment
//! and final submission.
//!
//! Students and professors only ever see projects they own or supervise;
//! anything else answers 404 so scoped reads do not reveal other rows.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pfehub_core::error::CoreError;
use pfehub_core::project::{
    AssignmentInput, Project, ProjectResubmission, ProjectSubmission, RejectionInput,
    RevisionRequest, ReviewDecision,
};
use pfehub_core::recommendation::Recommendation;
use pfehub_core::roles::Role;
use pfehub_core::types::DbId;
use pfehub_db::models::project::{ProjectFilter, ProjectStats};
use pfehub_db::repositories::ProjectRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireProfessor, RequireStudent};
use crate::query::{LimitParams, RecentParams, SearchParams};
use crate::response::DataResponse;
use crate::state::AppState;
use crate::storage::{UploadForm, FINAL_REPORTS, PROPOSALS};

/// Multipart field carrying the proposal document.
pub const PROPOSAL_FILE_FIELD: &str = "proposalFile";
/// Multipart field carrying the final report.
pub const FINAL_REPORT_FIELD: &str = "finalReport";
/// Feed length when `?limit=` is absent.
pub const DEFAULT_RECENT_LIMIT: u32 = 10;

/// Reject reads of a project outside the caller's scope.
pub(crate) fn ensure_visible(auth: &AuthUser, project: &Project) -> Result<(), AppError> {
    let visible = match auth.role {
        Role::Admin => true,
        Role::Student => project.student_id == auth.user_id,
        Role::Professor => project.professor_id == Some(auth.user_id),
    };
    if visible {
        Ok(())
    } else {
        Err(CoreError::NotFound {
            entity: "Project",
            id: project.id,
        }
        .into())
    }
}

/// Keywords arrive either as a JSON array string or comma-separated.
fn parse_keywords(raw: Option<String>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let parsed: Vec<String> = serde_json::from_str(&raw)
        .unwrap_or_else(|_| raw.split(',').map(str::to_string).collect());
    parsed
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

fn submission_from_form(form: &UploadForm) -> ProjectSubmission {
    ProjectSubmission {
        title: form.optional_text("title").unwrap_or_default(),
        description: form.optional_text("description").unwrap_or_default(),
        objectives: form.optional_text("objectives").unwrap_or_default(),
        context: form.optional_text("context"),
        methodology: form.optional_text("methodology"),
        expected_results: form.optional_text("expectedResults"),
        keywords: parse_keywords(form.optional_text("keywords")),
    }
}

/// POST /api/projects/submit
///
/// Multipart form with the proposal fields and an optional `proposalFile`.
/// The form is validated before the file is written.
pub async fn submit(
    State(state): State<AppState>,
    RequireStudent(auth): RequireStudent,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    let mut form = UploadForm::collect(multipart).await?;
    let input = submission_from_form(&form);
    input.validate()?;

    let proposal_file = match form.take_file(PROPOSAL_FILE_FIELD) {
        Some(file) => Some(state.storage.store(PROPOSALS, &file).await?),
        None => None,
    };

    let project = match ProjectRepo::submit(&state.pool, &auth.actor(), &input, proposal_file.clone())
        .await
    {
        Ok(project) => project,
        Err(e) => {
            if let Some(file) = &proposal_file {
                state.storage.discard(file).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        project_id = project.id,
        student_id = auth.user_id,
        "Project submitted"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/projects
///
/// Admin listing with optional `?status=&professorId=&studentId=` filters.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<ProjectFilter>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/projects/search?q=
///
/// Matches title, description and keywords, case-insensitively.
pub async fn search(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let text = params.q.unwrap_or_default();
    let projects = ProjectRepo::search(&state.pool, &text).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/projects/recent?limit=
pub async fn recent(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<RecentParams>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let projects = ProjectRepo::recent(&state.pool, limit).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/projects/stats
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<ProjectStats>>> {
    let stats = ProjectRepo::stats(&state.pool).await?;
    Ok(Json(DataResponse { data: stats }))
}

/// GET /api/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::find_by_id(&state.pool, id).await?;
    ensure_visible(&auth, &project)?;
    Ok(Json(DataResponse { data: project }))
}

/// GET /api/projects/student/{student_id}
///
/// 404 when the student has not submitted yet.
pub async fn get_by_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(student_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let not_found = || CoreError::NotFound {
        entity: "Project for student",
        id: student_id,
    };
    let project = ProjectRepo::find_by_student(&state.pool, student_id)
        .await?
        .ok_or_else(not_found)?;
    ensure_visible(&auth, &project).map_err(|_| not_found())?;
    Ok(Json(DataResponse { data: project }))
}

/// GET /api/projects/professor/{professor_id}
pub async fn list_by_professor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(professor_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    auth.ensure_self_or_admin("Professor", professor_id)?;
    let filter = ProjectFilter {
        professor_id: Some(professor_id),
        ..ProjectFilter::default()
    };
    let projects = ProjectRepo::list(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/projects/pending-assignments
///
/// Oldest submission first.
pub async fn pending_assignments(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::pending_assignments(&state.pool).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/projects/ready-for-defense
///
/// Professors see their own supervised projects; admins see all of them.
pub async fn ready_for_defense(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    auth.ensure_staff()?;
    let professor_id = (auth.role == Role::Professor).then_some(auth.user_id);
    let projects = ProjectRepo::ready_for_defense(&state.pool, professor_id).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// POST /api/projects/{id}/assign
pub async fn assign(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<AssignmentInput>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::assign(&state.pool, id, &admin.actor(), &input).await?;
    tracing::info!(
        project_id = id,
        professor_id = input.professor_id,
        user_id = admin.user_id,
        "Project assigned"
    );
    Ok(Json(DataResponse { data: project }))
}

/// GET /api/projects/{id}/recommendations
pub async fn recommendations(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<DataResponse<Vec<Recommendation>>>> {
    let limit = params.limit.unwrap_or(state.config.recommendation_limit);
    let ranked =
        ProjectRepo::recommendations(&state.pool, id, state.scoring.as_ref(), limit).await?;
    Ok(Json(DataResponse { data: ranked }))
}

/// PUT /api/projects/{id}/accept
pub async fn accept(
    State(state): State<AppState>,
    RequireProfessor(professor): RequireProfessor,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewDecision>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project =
        ProjectRepo::accept(&state.pool, id, &professor.actor(), input.comments.as_deref())
            .await?;
    tracing::info!(project_id = id, user_id = professor.user_id, "Project accepted");
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/projects/{id}/reject
pub async fn reject(
    State(state): State<AppState>,
    RequireProfessor(professor): RequireProfessor,
    Path(id): Path<DbId>,
    Json(input): Json<RejectionInput>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::reject(
        &state.pool,
        id,
        &professor.actor(),
        &input.reason,
        input.comments.as_deref(),
    )
    .await?;
    tracing::info!(project_id = id, user_id = professor.user_id, "Project rejected");
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/projects/{id}/request-revision
///
/// The project stays under review; the comments tell the student what to
/// change.
pub async fn request_revision(
    State(state): State<AppState>,
    RequireProfessor(professor): RequireProfessor,
    Path(id): Path<DbId>,
    Json(input): Json<RevisionRequest>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project =
        ProjectRepo::request_revision(&state.pool, id, &professor.actor(), &input.comments)
            .await?;
    tracing::info!(project_id = id, user_id = professor.user_id, "Project revision requested");
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/projects/{id}/resubmit
///
/// Sends a rejected project back to its supervisor with optional edits.
pub async fn resubmit(
    State(state): State<AppState>,
    RequireStudent(student): RequireStudent,
    Path(id): Path<DbId>,
    Json(input): Json<ProjectResubmission>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = ProjectRepo::resubmit(&state.pool, id, &student.actor(), &input).await?;
    tracing::info!(
        project_id = id,
        revision = project.revision,
        user_id = student.user_id,
        "Project resubmitted"
    );
    Ok(Json(DataResponse { data: project }))
}

/// POST /api/projects/{id}/final-submission
///
/// Multipart form with a required `finalReport` file.
pub async fn final_submission(
    State(state): State<AppState>,
    RequireStudent(student): RequireStudent,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<Project>>> {
    let mut form = UploadForm::collect(multipart).await?;
    let file = form.take_file(FINAL_REPORT_FIELD).ok_or_else(|| {
        CoreError::field(FINAL_REPORT_FIELD, "The final report file is required")
    })?;

    // Unknown or foreign projects fail before the upload is written.
    let current = ProjectRepo::find_by_id(&state.pool, id).await?;
    ensure_visible(&student, &current)?;

    let report = state.storage.store(FINAL_REPORTS, &file).await?;
    let project =
        match ProjectRepo::submit_final_report(&state.pool, id, &student.actor(), report.clone())
            .await
        {
            Ok(project) => project,
            Err(e) => {
                state.storage.discard(&report).await;
                return Err(e.into());
            }
        };

    tracing::info!(project_id = id, user_id = student.user_id, "Final report submitted");
    Ok(Json(DataResponse { data: project }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_accept_json_or_commas() {
        assert_eq!(
            parse_keywords(Some(r#"["web", " java "]"#.into())),
            vec!["web", "java"]
        );
        assert_eq!(
            parse_keywords(Some("machine learning, nlp,,".into())),
            vec!["machine learning", "nlp"]
        );
        assert!(parse_keywords(None).is_empty());
    }
}
