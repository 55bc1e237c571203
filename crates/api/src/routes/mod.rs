pub mod admin;
pub mod auth;
pub mod defense;
pub mod files;
pub mod health;
pub mod project;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                                  login (public)
/// /auth/logout                                 sign out
/// /auth/me                                     current user
///
/// /projects                                    list (admin)
/// /projects/submit                             submit proposal (student)
/// /projects/pending-assignments                awaiting assignment (admin)
/// /projects/search                             text search (admin)
/// /projects/recent                             latest submissions (admin)
/// /projects/stats                              counts by status, department (admin)
/// /projects/ready-for-defense                  final reports in (professor, admin)
/// /projects/student/{id}                       a student's project
/// /projects/professor/{id}                     a professor's projects
/// /projects/deliverables                       submit deliverable (student)
/// /projects/{id}                               get
/// /projects/{id}/assign                        assign supervisor (admin)
/// /projects/{id}/recommendations               ranked supervisors (admin)
/// /projects/{id}/accept                        accept (professor)
/// /projects/{id}/reject                        reject (professor)
/// /projects/{id}/request-revision              ask for changes (professor)
/// /projects/{id}/resubmit                      resubmit after rejection (student)
/// /projects/{id}/final-submission              final report (student)
/// /projects/{id}/deliverables                  list deliverables
///
/// /defenses/propose                            propose (professor)
/// /defenses/check-conflicts                    advisory slot check
/// /defenses/pending                            awaiting validation (admin)
/// /defenses/upcoming                           scheduled from a date
/// /defenses/range                              calendar between two dates
/// /defenses/evaluated                          graded defenses
/// /defenses/stats                              counts by status (admin)
/// /defenses/professor/{id}                     a professor's defenses
/// /defenses/student/{id}                       a student's defense
/// /defenses/{id}                               get
/// /defenses/{id}/evaluation                    evaluation, once graded
/// /defenses/{id}/jury                          president + examiners; replace (admin)
/// /defenses/{id}/validate|modify|reject        admin decisions
/// /defenses/{id}/repropose                     new slot after postponement
/// /defenses/{id}/evaluate                      grade (professor)
///
/// /admin/dashboard                             aggregate statistics
/// /admin/departments                           list, create
/// /admin/departments/{id}                      update, delete
/// /admin/departments/{id}/specializations      list by department
/// /admin/specializations                       list, create
/// /admin/specializations/{id}                  update, delete
/// /admin/academic-years                        list, create
/// /admin/academic-years/current                active year
/// /admin/academic-years/{id}                   update, delete
/// /admin/academic-years/{id}/activate          make current
///
/// /users/students                              list, create (admin)
/// /users/students/{id}                         update (admin)
/// /users/professors                            list, create
/// /users/professors/available                  with free capacity (admin)
/// /users/professors/{id}                       update (admin)
/// /users/{id}                                  delete (admin)
///
/// /files/download/{category}/{name}            stored upload, as attachment
/// /files/view/{category}/{name}                stored upload, inline
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
        .nest("/defenses", defense::router())
        .nest("/admin", admin::router())
        .nest("/users", users::router())
        .nest("/files", files::router())
}
