//! Route definitions for the `/users` resource.

use axum::routing::{delete, get, put};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /students               -> list_students (admin)
/// POST   /students               -> create_student (admin)
/// PUT    /students/{id}          -> update_student (admin)
/// GET    /professors             -> list_professors (professor, admin)
/// POST   /professors             -> create_professor (admin)
/// GET    /professors/available   -> available_professors (admin)
/// PUT    /professors/{id}        -> update_professor (admin)
/// DELETE /{id}                   -> delete_user (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/students",
            get(users::list_students).post(users::create_student),
        )
        .route("/students/{id}", put(users::update_student))
        .route(
            "/professors",
            get(users::list_professors).post(users::create_professor),
        )
        .route("/professors/available", get(users::available_professors))
        .route("/professors/{id}", put(users::update_professor))
        .route("/{id}", delete(users::delete_user))
}
