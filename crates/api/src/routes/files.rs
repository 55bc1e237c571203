//! Route definitions for the `/files` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::files;
use crate::state::AppState;

/// Routes mounted at `/files`.
///
/// ```text
/// GET /download/{category}/{name}   -> download (attachment)
/// GET /view/{category}/{name}       -> view (inline)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/download/{category}/{name}", get(files::download))
        .route("/view/{category}/{name}", get(files::view))
}
