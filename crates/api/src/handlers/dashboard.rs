//! Admin dashboard aggregates.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use pfehub_core::stats::DashboardStats;
use pfehub_db::repositories::StatsRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/admin/dashboard
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<DashboardStats>>> {
    let stats = StatsRepo::dashboard(&state.pool, Utc::now().date_naive()).await?;
    Ok(Json(DataResponse { data: stats }))
}
