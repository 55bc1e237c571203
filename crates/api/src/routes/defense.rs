//! Route definitions for the `/defenses` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::defense;
use crate::state::AppState;

/// Routes mounted at `/defenses`.
///
/// ```text
/// POST /propose                      -> propose (professor)
/// GET  /check-conflicts              -> check_conflicts (professor, admin)
/// GET  /pending                      -> pending (admin)
/// GET  /upcoming                     -> upcoming (professor, admin)
/// GET  /range?startDate=&endDate=    -> in_range (professor, admin)
/// GET  /evaluated                    -> evaluated (professor, admin)
/// GET  /stats                        -> stats (admin)
/// GET  /professor/{professor_id}     -> list_by_professor
/// GET  /student/{student_id}         -> get_by_student
///
/// GET  /{id}                         -> get_by_id
/// GET  /{id}/evaluation              -> get_evaluation
/// GET  /{id}/jury                    -> get_jury
/// PUT  /{id}/validate                -> validate (admin)
/// PUT  /{id}/modify                  -> modify (admin)
/// PUT  /{id}/reject                  -> reject (admin)
/// PUT  /{id}/repropose               -> repropose (professor)
/// POST /{id}/evaluate                -> evaluate (professor)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/propose", post(defense::propose))
        .route("/check-conflicts", get(defense::check_conflicts))
        .route("/pending", get(defense::pending))
        .route("/upcoming", get(defense::upcoming))
        .route("/range", get(defense::in_range))
        .route("/evaluated", get(defense::evaluated))
        .route("/stats", get(defense::stats))
        .route("/professor/{professor_id}", get(defense::list_by_professor))
        .route("/student/{student_id}", get(defense::get_by_student))
        .route("/{id}", get(defense::get_by_id))
        .route("/{id}/evaluation", get(defense::get_evaluation))
        .route("/{id}/jury", get(defense::get_jury).put(defense::update_jury))
        .route("/{id}/validate", put(defense::validate))
        .route("/{id}/modify", put(defense::modify))
        .route("/{id}/reject", put(defense::reject))
        .route("/{id}/repropose", put(defense::repropose))
        .route("/{id}/evaluate", post(defense::evaluate))
}
