//! Handlers for project deliverables.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use pfehub_core::deliverable::{Deliverable, DeliverableKind, DeliverableSubmission};
use pfehub_core::error::CoreError;
use pfehub_core::types::DbId;
use pfehub_db::repositories::{DeliverableRepo, ProjectRepo};
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::project::ensure_visible;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireStudent;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::storage::{UploadForm, DELIVERABLES};

/// Multipart field carrying the deliverable file.
pub const DELIVERABLE_FILE_FIELD: &str = "file";

fn submission_from_form(form: &UploadForm) -> Result<DeliverableSubmission, CoreError> {
    let project_id = form
        .text("projectId")?
        .parse::<DbId>()
        .map_err(|_| CoreError::field("projectId", "projectId must be an integer"))?;
    Ok(DeliverableSubmission {
        project_id,
        title: form.optional_text("title").unwrap_or_default(),
        description: form.optional_text("description").unwrap_or_default(),
        kind: DeliverableKind::parse(&form.text("kind")?)?,
        notes: form.optional_text("notes"),
    })
}

/// POST /api/projects/deliverables
///
/// Multipart form: `projectId`, `title`, `description`, `kind`, optional
/// `notes`, and the `file` itself.
pub async fn create(
    State(state): State<AppState>,
    RequireStudent(student): RequireStudent,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Deliverable>>)> {
    let mut form = UploadForm::collect(multipart).await?;
    let input = submission_from_form(&form)?;
    input.validate()?;
    let upload = form.take_file(DELIVERABLE_FILE_FIELD).ok_or_else(|| {
        CoreError::field(DELIVERABLE_FILE_FIELD, "A deliverable file is required")
    })?;

    let project = ProjectRepo::find_by_id(&state.pool, input.project_id).await?;
    ensure_visible(&student, &project)?;

    let file = state.storage.store(DELIVERABLES, &upload).await?;
    let deliverable =
        match DeliverableRepo::create(&state.pool, &student.actor(), &input, file.clone()).await {
            Ok(deliverable) => deliverable,
            Err(e) => {
                state.storage.discard(&file).await;
                return Err(e.into());
            }
        };

    tracing::info!(
        deliverable_id = deliverable.id,
        project_id = input.project_id,
        kind = deliverable.kind.as_str(),
        "Deliverable submitted"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: deliverable })))
}

/// GET /api/projects/{id}/deliverables
pub async fn list_for_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Deliverable>>>> {
    let project = ProjectRepo::find_by_id(&state.pool, project_id).await?;
    ensure_visible(&auth, &project)?;
    let deliverables = DeliverableRepo::list_for_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: deliverables }))
}
