//! Route definitions for the `/admin` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{academic, dashboard};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET  /dashboard                              -> dashboard::stats
/// GET  /departments                            -> list_departments
/// POST /departments                            -> create_department
/// PUT  /departments/{id}                       -> update_department
/// DEL  /departments/{id}                       -> delete_department
/// GET  /departments/{id}/specializations       -> list_department_specializations
/// GET  /specializations                        -> list_specializations
/// POST /specializations                        -> create_specialization
/// PUT  /specializations/{id}                   -> update_specialization
/// DEL  /specializations/{id}                   -> delete_specialization
/// GET  /academic-years                         -> list_years
/// POST /academic-years                         -> create_year
/// GET  /academic-years/current                 -> current_year
/// PUT  /academic-years/{id}                    -> update_year
/// DEL  /academic-years/{id}                    -> delete_year
/// PUT  /academic-years/{id}/activate           -> activate_year
/// ```
///
/// Department, specialization and current-year reads are open to any
/// authenticated user since submission forms need them.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::stats))
        .route(
            "/departments",
            get(academic::list_departments).post(academic::create_department),
        )
        .route(
            "/departments/{id}",
            put(academic::update_department).delete(academic::delete_department),
        )
        .route(
            "/departments/{id}/specializations",
            get(academic::list_department_specializations),
        )
        .route(
            "/specializations",
            get(academic::list_specializations).post(academic::create_specialization),
        )
        .route(
            "/academic-years",
            get(academic::list_years).post(academic::create_year),
        )
        .route(
            "/specializations/{id}",
            put(academic::update_specialization).delete(academic::delete_specialization),
        )
        .route("/academic-years/current", get(academic::current_year))
        .route(
            "/academic-years/{id}",
            put(academic::update_year).delete(academic::delete_year),
        )
        .route("/academic-years/{id}/activate", put(academic::activate_year))
}
