//! Handlers for the `/users` resource: directory listings and account
//! management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pfehub_core::roles::Role;
use pfehub_core::users::{User, UserProfile, DEFAULT_MAX_PROJECT_CAPACITY};
use pfehub_core::types::DbId;
use pfehub_core::error::CoreError;
use pfehub_db::models::user::{CreateUser, UpdateUser};
use pfehub_db::repositories::UserRepo;
use serde::Deserialize;
use validator::Validate;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Minimum length for passwords set through account creation.
pub const MIN_PASSWORD_LENGTH: u64 = 8;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Fields shared by every account kind.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AccountInput {
    #[validate(length(min = 1, max = 100, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last name is required"))]
    pub last_name: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = MIN_PASSWORD_LENGTH, message = "password is too short"))]
    pub password: String,
    pub department_id: Option<DbId>,
    pub specialization_id: Option<DbId>,
}

/// Request body for `POST /users/students`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub account: AccountInput,
    #[validate(length(min = 1, message = "student number is required"))]
    pub student_number: String,
    #[validate(length(min = 1, message = "promotion is required"))]
    pub promotion: String,
}

/// Request body for `POST /users/professors`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfessorRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub account: AccountInput,
    #[serde(default)]
    pub expertise: Vec<String>,
    #[validate(range(min = 1, max = 20, message = "capacity must be between 1 and 20"))]
    pub max_project_capacity: Option<u32>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn create_account(
    state: &AppState,
    account: AccountInput,
    profile: UserProfile,
) -> AppResult<User> {
    let password_hash = hash_password(&account.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    let user = UserRepo::create(
        &state.pool,
        CreateUser {
            first_name: account.first_name.trim().to_string(),
            last_name: account.last_name.trim().to_string(),
            email: account.email,
            password_hash,
            department_id: account.department_id,
            specialization_id: account.specialization_id,
            profile,
        },
    )
    .await?;
    Ok(user)
}

/// GET /api/users/students
pub async fn list_students(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<User>>>> {
    let users = UserRepo::list_by_role(&state.pool, Role::Student).await?;
    Ok(Json(DataResponse { data: users }))
}

/// GET /api/users/professors
///
/// Includes each professor's live workload. Professors may read the
/// directory too (jury composition needs it).
pub async fn list_professors(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<User>>>> {
    auth.ensure_staff()?;
    let users = UserRepo::list_by_role(&state.pool, Role::Professor).await?;
    Ok(Json(DataResponse { data: users }))
}

/// GET /api/users/professors/available
///
/// Active professors with free capacity, least loaded first.
pub async fn available_professors(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<User>>>> {
    let users = UserRepo::available_professors(&state.pool).await?;
    Ok(Json(DataResponse { data: users }))
}

/// POST /api/users/students
pub async fn create_student(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateStudentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<User>>)> {
    input.validate()?;
    let profile = UserProfile::Student {
        student_number: input.student_number.trim().to_string(),
        promotion: input.promotion.trim().to_string(),
    };
    let user = create_account(&state, input.account, profile).await?;
    tracing::info!(new_user_id = user.id, user_id = admin.user_id, "Student account created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

/// POST /api/users/professors
pub async fn create_professor(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateProfessorRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<User>>)> {
    input.validate()?;
    let profile = UserProfile::Professor {
        expertise: input
            .expertise
            .iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect(),
        current_project_count: 0,
        max_project_capacity: input
            .max_project_capacity
            .unwrap_or(DEFAULT_MAX_PROJECT_CAPACITY),
    };
    let user = create_account(&state, input.account, profile).await?;
    tracing::info!(new_user_id = user.id, user_id = admin.user_id, "Professor account created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

/// Update a user after checking it holds `role`; other accounts read as
/// missing.
async fn update_with_role(
    state: &AppState,
    id: DbId,
    role: Role,
    input: &UpdateUser,
) -> AppResult<User> {
    input.validate()?;
    let existing = UserRepo::find_by_id(&state.pool, id).await?;
    if existing.role() != role {
        let entity = match role {
            Role::Student => "Student",
            Role::Professor => "Professor",
            Role::Admin => "Admin",
        };
        return Err(CoreError::NotFound { entity, id }.into());
    }
    Ok(UserRepo::update(&state.pool, id, input).await?)
}

/// PUT /api/users/students/{id}
pub async fn update_student(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<Json<DataResponse<User>>> {
    let user = update_with_role(&state, id, Role::Student, &input).await?;
    tracing::info!(target_user_id = id, user_id = admin.user_id, "Student account updated");
    Ok(Json(DataResponse { data: user }))
}

/// PUT /api/users/professors/{id}
///
/// 409 when the new capacity is below the professor's current load.
pub async fn update_professor(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<Json<DataResponse<User>>> {
    let user = update_with_role(&state, id, Role::Professor, &input).await?;
    tracing::info!(target_user_id = id, user_id = admin.user_id, "Professor account updated");
    Ok(Json(DataResponse { data: user }))
}

/// DELETE /api/users/{id}
///
/// 409 while projects or defenses refer to the account.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if id == admin.user_id {
        return Err(CoreError::Conflict("You cannot delete your own account".into()).into());
    }
    UserRepo::delete(&state.pool, id).await?;
    tracing::info!(target_user_id = id, user_id = admin.user_id, "User account deleted");
    Ok(StatusCode::NO_CONTENT)
}
