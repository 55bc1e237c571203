//! Route definitions for the `/projects` resource, including deliverables.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{deliverable, project};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET  /                              -> list (admin)
/// POST /submit                        -> submit (student, multipart)
/// GET  /pending-assignments           -> pending_assignments (admin)
/// GET  /search?q=                     -> search (admin)
/// GET  /recent?limit=                 -> recent (admin)
/// GET  /stats                         -> stats (admin)
/// GET  /ready-for-defense             -> ready_for_defense (professor, admin)
/// GET  /student/{student_id}          -> get_by_student
/// GET  /professor/{professor_id}      -> list_by_professor
/// POST /deliverables                  -> deliverable::create (student, multipart)
///
/// GET  /{id}                          -> get_by_id
/// POST /{id}/assign                   -> assign (admin)
/// GET  /{id}/recommendations          -> recommendations (admin)
/// PUT  /{id}/accept                   -> accept (professor)
/// PUT  /{id}/reject                   -> reject (professor)
/// PUT  /{id}/request-revision         -> request_revision (professor)
/// PUT  /{id}/resubmit                 -> resubmit (student)
/// POST /{id}/final-submission         -> final_submission (student, multipart)
/// GET  /{id}/deliverables             -> deliverable::list_for_project
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list))
        .route("/submit", post(project::submit))
        .route("/pending-assignments", get(project::pending_assignments))
        .route("/ready-for-defense", get(project::ready_for_defense))
        .route("/search", get(project::search))
        .route("/recent", get(project::recent))
        .route("/stats", get(project::stats))
        .route("/student/{student_id}", get(project::get_by_student))
        .route("/professor/{professor_id}", get(project::list_by_professor))
        .route("/deliverables", post(deliverable::create))
        .route("/{id}", get(project::get_by_id))
        .route("/{id}/assign", post(project::assign))
        .route("/{id}/recommendations", get(project::recommendations))
        .route("/{id}/accept", put(project::accept))
        .route("/{id}/reject", put(project::reject))
        .route("/{id}/request-revision", put(project::request_revision))
        .route("/{id}/resubmit", put(project::resubmit))
        .route("/{id}/final-submission", post(project::final_submission))
        .route("/{id}/deliverables", get(deliverable::list_for_project))
}
