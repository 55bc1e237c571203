//! Serving stored uploads back to the users allowed to see them.
//!
//! A file is readable by whoever can read the project that references it;
//! paths that no project references answer 404.

use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use pfehub_db::models::project::FileOwner;
use pfehub_db::repositories::ProjectRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::project::ensure_visible;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::storage::FileStorage;

/// How the browser should treat the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Attachment,
    Inline,
}

/// Content type from the stored name's extension.
fn content_type(name: &str) -> &'static str {
    let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("ppt") => "application/vnd.ms-powerpoint",
        Some("pptx") => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

async fn serve(
    state: &AppState,
    auth: &AuthUser,
    category: &str,
    name: &str,
    disposition: Disposition,
) -> AppResult<Response> {
    let not_found = || AppError::NotFound(format!("File {category}/{name} not found"));
    let path = FileStorage::stored_path(category, name).ok_or_else(not_found)?;
    let owner = ProjectRepo::find_file_owner(&state.pool, &path)
        .await?
        .ok_or_else(not_found)?;
    let project = ProjectRepo::find_by_id(&state.pool, owner.project_id()).await?;
    ensure_visible(auth, &project).map_err(|_| not_found())?;

    let data = state.storage.read(&path).await?;
    let kind = match disposition {
        Disposition::Attachment => "attachment",
        Disposition::Inline => "inline",
    };
    let disposition = HeaderValue::from_str(&format!("{kind}; filename=\"{name}\""))
        .map_err(|e| AppError::InternalError(format!("content disposition for {path}: {e}")))?;

    let deliverable_id = match owner {
        FileOwner::Deliverable { deliverable_id, .. } => Some(deliverable_id),
        FileOwner::Proposal(_) | FileOwner::FinalReport(_) => None,
    };
    tracing::debug!(
        path = %path,
        project_id = project.id,
        ?deliverable_id,
        user_id = auth.user_id,
        "Serving stored file"
    );
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type(name))),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    )
        .into_response())
}

/// GET /api/files/download/{category}/{name}
pub async fn download(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((category, name)): Path<(String, String)>,
) -> AppResult<Response> {
    serve(&state, &auth, &category, &name, Disposition::Attachment).await
}

/// GET /api/files/view/{category}/{name}
pub async fn view(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((category, name)): Path<(String, String)>,
) -> AppResult<Response> {
    serve(&state, &auth, &category, &name, Disposition::Inline).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type("abc-rapport.PDF"), "application/pdf");
        assert_eq!(content_type("abc-code.zip"), "application/zip");
        assert_eq!(content_type("abc-noext"), "application/octet-stream");
    }
}
