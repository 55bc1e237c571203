//! Admin handlers for departments, specializations and academic years.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pfehub_core::academic::{
    AcademicYear, AcademicYearInput, Department, DepartmentInput, Specialization,
    SpecializationInput,
};
use pfehub_core::error::CoreError;
use pfehub_core::types::DbId;
use pfehub_db::models::academic::{UpdateAcademicYear, UpdateDepartment, UpdateSpecialization};
use pfehub_db::repositories::AcademicRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::DepartmentParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/admin/departments
pub async fn list_departments(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Department>>>> {
    let departments = AcademicRepo::list_departments(&state.pool).await?;
    Ok(Json(DataResponse { data: departments }))
}

/// POST /api/admin/departments
pub async fn create_department(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<DepartmentInput>,
) -> AppResult<(StatusCode, Json<DataResponse<Department>>)> {
    let department = AcademicRepo::create_department(&state.pool, &input).await?;
    tracing::info!(
        department_id = department.id,
        code = %department.code,
        user_id = admin.user_id,
        "Department created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: department })))
}

/// PUT /api/admin/departments/{id}
pub async fn update_department(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDepartment>,
) -> AppResult<Json<DataResponse<Department>>> {
    let department = AcademicRepo::update_department(&state.pool, id, &input).await?;
    tracing::info!(department_id = id, user_id = admin.user_id, "Department updated");
    Ok(Json(DataResponse { data: department }))
}

/// DELETE /api/admin/departments/{id}
///
/// 409 while specializations or users still reference the department.
pub async fn delete_department(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    AcademicRepo::delete_department(&state.pool, id).await?;
    tracing::info!(department_id = id, user_id = admin.user_id, "Department deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/specializations?departmentId=
pub async fn list_specializations(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<DepartmentParams>,
) -> AppResult<Json<DataResponse<Vec<Specialization>>>> {
    let specializations =
        AcademicRepo::list_specializations(&state.pool, params.department_id).await?;
    Ok(Json(DataResponse {
        data: specializations,
    }))
}

/// GET /api/admin/departments/{id}/specializations
pub async fn list_department_specializations(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(department_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Specialization>>>> {
    let specializations =
        AcademicRepo::list_specializations(&state.pool, Some(department_id)).await?;
    Ok(Json(DataResponse {
        data: specializations,
    }))
}

/// POST /api/admin/specializations
pub async fn create_specialization(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<SpecializationInput>,
) -> AppResult<(StatusCode, Json<DataResponse<Specialization>>)> {
    let specialization = AcademicRepo::create_specialization(&state.pool, &input).await?;
    tracing::info!(
        specialization_id = specialization.id,
        department_id = specialization.department_id,
        user_id = admin.user_id,
        "Specialization created"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: specialization,
        }),
    ))
}

/// PUT /api/admin/specializations/{id}
pub async fn update_specialization(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateSpecialization>,
) -> AppResult<Json<DataResponse<Specialization>>> {
    let specialization = AcademicRepo::update_specialization(&state.pool, id, &input).await?;
    tracing::info!(specialization_id = id, user_id = admin.user_id, "Specialization updated");
    Ok(Json(DataResponse {
        data: specialization,
    }))
}

/// DELETE /api/admin/specializations/{id}
pub async fn delete_specialization(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    AcademicRepo::delete_specialization(&state.pool, id).await?;
    tracing::info!(specialization_id = id, user_id = admin.user_id, "Specialization deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/admin/academic-years
pub async fn list_years(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<AcademicYear>>>> {
    let years = AcademicRepo::list_years(&state.pool).await?;
    Ok(Json(DataResponse { data: years }))
}

/// POST /api/admin/academic-years
pub async fn create_year(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<AcademicYearInput>,
) -> AppResult<(StatusCode, Json<DataResponse<AcademicYear>>)> {
    let year = AcademicRepo::create_year(&state.pool, &input).await?;
    tracing::info!(
        academic_year_id = year.id,
        year = %year.year,
        is_current = year.is_current,
        user_id = admin.user_id,
        "Academic year created"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: year })))
}

/// GET /api/admin/academic-years/current
///
/// 404 when no year is active.
pub async fn current_year(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<DataResponse<AcademicYear>>> {
    let year = AcademicRepo::current_year(&state.pool)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Current academic year",
            id: 0,
        })?;
    Ok(Json(DataResponse { data: year }))
}

/// PUT /api/admin/academic-years/{id}/activate
pub async fn activate_year(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<AcademicYear>>> {
    let year = AcademicRepo::activate_year(&state.pool, id).await?;
    tracing::info!(academic_year_id = id, user_id = admin.user_id, "Academic year activated");
    Ok(Json(DataResponse { data: year }))
}

/// PUT /api/admin/academic-years/{id}
pub async fn update_year(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAcademicYear>,
) -> AppResult<Json<DataResponse<AcademicYear>>> {
    let year = AcademicRepo::update_year(&state.pool, id, &input).await?;
    tracing::info!(
        academic_year_id = id,
        is_current = year.is_current,
        user_id = admin.user_id,
        "Academic year updated"
    );
    Ok(Json(DataResponse { data: year }))
}

/// DELETE /api/admin/academic-years/{id}
///
/// The current year cannot be deleted.
pub async fn delete_year(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    AcademicRepo::delete_year(&state.pool, id).await?;
    tracing::info!(academic_year_id = id, user_id = admin.user_id, "Academic year deleted");
    Ok(StatusCode::NO_CONTENT)
}
