//! Handlers for the `/defenses` resource.
//!
//! Professors propose, repropose and evaluate; admins validate, modify and
//! report. Reads follow the owning project's visibility.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use pfehub_core::conflict::ConflictReport;
use pfehub_core::defense::{
    Defense, DefenseModification, DefenseProposal, DefenseRejection, DefenseValidation,
    JuryUpdate,
};
use pfehub_core::error::CoreError;
use pfehub_core::evaluation::{DefenseEvaluation, EvaluationSubmission};
use pfehub_core::jury::JuryMember;
use pfehub_core::roles::Role;
use pfehub_core::stats::DefenseStats;
use pfehub_core::schedule::{self, Slot};
use pfehub_core::types::DbId;
use pfehub_db::repositories::{DefenseRepo, ProjectRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::project::ensure_visible;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireProfessor};
use crate::query::{ConflictCheckParams, DateRangeParams, UpcomingParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Load a defense the caller may read, answering 404 otherwise.
async fn visible_defense(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<Defense> {
    let defense = DefenseRepo::find_by_id(&state.pool, id).await?;
    let project = ProjectRepo::find_by_id(&state.pool, defense.project_id).await?;
    ensure_visible(auth, &project).map_err(|_| {
        AppError::Core(CoreError::NotFound {
            entity: "Defense",
            id,
        })
    })?;
    Ok(defense)
}

/// Narrow a listing to the professor's own defenses; admins keep all.
async fn scoped(state: &AppState, auth: &AuthUser, mut defenses: Vec<Defense>) -> AppResult<Vec<Defense>> {
    if auth.role == Role::Professor {
        let own: Vec<DbId> = DefenseRepo::list_for_professor(&state.pool, auth.user_id)
            .await?
            .iter()
            .map(|d| d.id)
            .collect();
        defenses.retain(|d| own.contains(&d.id));
    }
    Ok(defenses)
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// POST /api/defenses/propose
pub async fn propose(
    State(state): State<AppState>,
    RequireProfessor(professor): RequireProfessor,
    Json(input): Json<DefenseProposal>,
) -> AppResult<(StatusCode, Json<DataResponse<Defense>>)> {
    let defense = DefenseRepo::propose(&state.pool, &professor.actor(), &input).await?;
    tracing::info!(
        defense_id = defense.id,
        project_id = defense.project_id,
        user_id = professor.user_id,
        "Defense proposed"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: defense })))
}

/// PUT /api/defenses/{id}/validate
///
/// Omitted final date, time, room or jury keep the proposed values.
pub async fn validate(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<DefenseValidation>,
) -> AppResult<Json<DataResponse<Defense>>> {
    let defense = DefenseRepo::validate(&state.pool, id, &admin.actor(), &input).await?;
    tracing::info!(defense_id = id, user_id = admin.user_id, "Defense validated");
    Ok(Json(DataResponse { data: defense }))
}

/// PUT /api/defenses/{id}/modify
pub async fn modify(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<DefenseModification>,
) -> AppResult<Json<DataResponse<Defense>>> {
    let defense = DefenseRepo::modify(&state.pool, id, &admin.actor(), &input).await?;
    tracing::info!(defense_id = id, user_id = admin.user_id, "Defense modified");
    Ok(Json(DataResponse { data: defense }))
}

/// PUT /api/defenses/{id}/reject
///
/// Postpones the defense (`REPORTEE`) and returns the project to final submission.
pub async fn reject(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<DefenseRejection>,
) -> AppResult<Json<DataResponse<Defense>>> {
    let defense = DefenseRepo::reject(&state.pool, id, &admin.actor(), &input.reason).await?;
    tracing::info!(defense_id = id, user_id = admin.user_id, "Defense postponed");
    Ok(Json(DataResponse { data: defense }))
}

/// PUT /api/defenses/{id}/repropose
pub async fn repropose(
    State(state): State<AppState>,
    RequireProfessor(professor): RequireProfessor,
    Path(id): Path<DbId>,
    Json(input): Json<DefenseProposal>,
) -> AppResult<Json<DataResponse<Defense>>> {
    let defense = DefenseRepo::repropose(&state.pool, id, &professor.actor(), &input).await?;
    tracing::info!(
        defense_id = id,
        revision = defense.revision,
        user_id = professor.user_id,
        "Defense reproposed"
    );
    Ok(Json(DataResponse { data: defense }))
}

/// POST /api/defenses/{id}/evaluate
pub async fn evaluate(
    State(state): State<AppState>,
    RequireProfessor(professor): RequireProfessor,
    Path(id): Path<DbId>,
    Json(input): Json<EvaluationSubmission>,
) -> AppResult<Json<DataResponse<Defense>>> {
    let defense = DefenseRepo::evaluate(&state.pool, id, &professor.actor(), input).await?;
    tracing::info!(
        defense_id = id,
        project_id = defense.project_id,
        user_id = professor.user_id,
        "Defense evaluated"
    );
    Ok(Json(DataResponse { data: defense }))
}

/// PUT /api/defenses/{id}/jury
///
/// Replaces the examiners until the defense is graded.
pub async fn update_jury(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<JuryUpdate>,
) -> AppResult<Json<DataResponse<Defense>>> {
    let defense = DefenseRepo::update_jury(&state.pool, id, &admin.actor(), &input).await?;
    tracing::info!(
        defense_id = id,
        examiners = defense.jury_members.len(),
        user_id = admin.user_id,
        "Defense jury updated"
    );
    Ok(Json(DataResponse { data: defense }))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/defenses/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Defense>>> {
    let defense = visible_defense(&state, &auth, id).await?;
    Ok(Json(DataResponse { data: defense }))
}

/// GET /api/defenses/{id}/evaluation
///
/// 404 until the defense has been evaluated.
pub async fn get_evaluation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DefenseEvaluation>>> {
    visible_defense(&state, &auth, id).await?;
    let evaluation = DefenseRepo::evaluation(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Evaluation for defense",
            id,
        })?;
    Ok(Json(DataResponse { data: evaluation }))
}

/// GET /api/defenses/{id}/jury
///
/// The rendered jury: the supervising professor as president followed by
/// the stored examiners.
pub async fn get_jury(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<JuryMember>>>> {
    let defense = visible_defense(&state, &auth, id).await?;
    let project = ProjectRepo::find_by_id(&state.pool, defense.project_id).await?;
    let professor_id = project.professor_id.ok_or_else(|| {
        AppError::InternalError(format!("project {} has a defense but no supervisor", project.id))
    })?;
    let president = UserRepo::find_by_id(&state.pool, professor_id).await?;
    Ok(Json(DataResponse {
        data: defense.effective_jury(&president),
    }))
}

/// GET /api/defenses/check-conflicts?date=&time=&room=
///
/// Advisory only; proposals are never blocked by a reported conflict.
pub async fn check_conflicts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ConflictCheckParams>,
) -> AppResult<Json<DataResponse<ConflictReport>>> {
    auth.ensure_staff()?;
    let slot = Slot::new(
        schedule::parse_date(&params.date)?,
        schedule::parse_time(&params.time)?,
        &params.room,
    )?;
    let report = DefenseRepo::check_conflicts(&state.pool, &slot, params.exclude_id).await?;
    Ok(Json(DataResponse { data: report }))
}

/// GET /api/defenses/pending
pub async fn pending(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<Defense>>>> {
    let defenses = DefenseRepo::pending(&state.pool).await?;
    Ok(Json(DataResponse { data: defenses }))
}

/// GET /api/defenses/professor/{professor_id}
pub async fn list_by_professor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(professor_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Defense>>>> {
    auth.ensure_self_or_admin("Professor", professor_id)?;
    let defenses = DefenseRepo::list_for_professor(&state.pool, professor_id).await?;
    Ok(Json(DataResponse { data: defenses }))
}

/// GET /api/defenses/student/{student_id}
///
/// 404 when no defense has been proposed for the student's project.
pub async fn get_by_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(student_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Defense>>> {
    let not_found = CoreError::NotFound {
        entity: "Defense for student",
        id: student_id,
    };
    if auth.role == Role::Student && auth.user_id != student_id {
        return Err(not_found.into());
    }
    let defense = DefenseRepo::find_by_student(&state.pool, student_id)
        .await?
        .ok_or(not_found)?;
    // Professors only see defenses of projects they supervise.
    let defense = visible_defense(&state, &auth, defense.id).await?;
    Ok(Json(DataResponse { data: defense }))
}

/// GET /api/defenses/upcoming?from=YYYY-MM-DD
///
/// Scheduled defenses from `from` (default today). Professors get their own.
pub async fn upcoming(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<UpcomingParams>,
) -> AppResult<Json<DataResponse<Vec<Defense>>>> {
    auth.ensure_staff()?;
    let from = params.from.unwrap_or_else(|| Utc::now().date_naive());
    let defenses = DefenseRepo::upcoming(&state.pool, from).await?;
    let defenses = scoped(&state, &auth, defenses).await?;
    Ok(Json(DataResponse { data: defenses }))
}

/// GET /api/defenses/range?startDate=&endDate=
///
/// Live defenses on the calendar between both dates, inclusive.
pub async fn in_range(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<DateRangeParams>,
) -> AppResult<Json<DataResponse<Vec<Defense>>>> {
    auth.ensure_staff()?;
    let start = schedule::parse_date(&params.start_date)
        .map_err(|_| CoreError::field("startDate", "startDate must be YYYY-MM-DD"))?;
    let end = schedule::parse_date(&params.end_date)
        .map_err(|_| CoreError::field("endDate", "endDate must be YYYY-MM-DD"))?;
    let defenses = DefenseRepo::in_range(&state.pool, start, end).await?;
    let defenses = scoped(&state, &auth, defenses).await?;
    Ok(Json(DataResponse { data: defenses }))
}

/// GET /api/defenses/evaluated
///
/// Most recently graded first. Professors get their own.
pub async fn evaluated(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Defense>>>> {
    auth.ensure_staff()?;
    let defenses = DefenseRepo::evaluated(&state.pool).await?;
    let defenses = scoped(&state, &auth, defenses).await?;
    Ok(Json(DataResponse { data: defenses }))
}

/// GET /api/defenses/stats
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<DefenseStats>>> {
    let stats = DefenseRepo::stats(&state.pool, Utc::now().date_naive()).await?;
    Ok(Json(DataResponse { data: stats }))
}
