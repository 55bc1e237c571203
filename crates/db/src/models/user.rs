//! User rows, records and DTOs.

use pfehub_core::project::ProjectStatus;
use pfehub_core::roles::Role;
use pfehub_core::types::{DbId, Timestamp};
use pfehub_core::users::{User, UserProfile};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::FromRow;
use validator::Validate;

use crate::{to_u32, DbError, DbResult};

/// A row from the `users` table, joined with the professor's live load.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub department_id: Option<DbId>,
    pub specialization_id: Option<DbId>,
    pub is_active: bool,
    pub student_number: Option<String>,
    pub promotion: Option<String>,
    pub expertise: Option<Json<Vec<String>>>,
    pub max_project_capacity: Option<i64>,
    pub permissions: Option<Json<Vec<String>>>,
    pub created_at: Timestamp,
    /// Computed: projects of this user in a status that occupies a supervisor.
    pub current_project_count: i64,
}

/// Column list for user queries; the table is aliased `u`.
pub fn user_columns() -> String {
    format!(
        "u.id, u.first_name, u.last_name, u.email, u.password_hash, u.role, \
         u.department_id, u.specialization_id, u.is_active, u.student_number, \
         u.promotion, u.expertise, u.max_project_capacity, u.permissions, u.created_at, \
         (SELECT COUNT(*) FROM projects p WHERE p.professor_id = u.id \
            AND p.status NOT IN ({})) AS current_project_count",
        released_statuses()
    )
}

/// Quoted statuses that free a professor's supervision slot.
pub fn released_statuses() -> String {
    ProjectStatus::ALL
        .iter()
        .filter(|s| !s.occupies_supervisor())
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl UserRow {
    pub fn into_record(self) -> DbResult<UserRecord> {
        let role = Role::parse(&self.role).map_err(|e| DbError::corrupt("User", self.id, e))?;
        let profile = match role {
            Role::Student => UserProfile::Student {
                student_number: self.student_number.unwrap_or_default(),
                promotion: self.promotion.unwrap_or_default(),
            },
            Role::Professor => UserProfile::Professor {
                expertise: self.expertise.map(|j| j.0).unwrap_or_default(),
                current_project_count: to_u32("User", self.id, self.current_project_count)?,
                max_project_capacity: to_u32(
                    "User",
                    self.id,
                    self.max_project_capacity.unwrap_or_default(),
                )?,
            },
            Role::Admin => UserProfile::Admin {
                permissions: self.permissions.map(|j| j.0).unwrap_or_default(),
            },
        };
        Ok(UserRecord {
            user: User {
                id: self.id,
                first_name: self.first_name,
                last_name: self.last_name,
                email: self.email,
                department_id: self.department_id,
                specialization_id: self.specialization_id,
                is_active: self.is_active,
                created_at: self.created_at,
                profile,
            },
            password_hash: self.password_hash,
        })
    }

    pub fn into_user(self) -> DbResult<User> {
        Ok(self.into_record()?.user)
    }
}

/// The public user plus its credential.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    /// argon2 PHC string.
    pub password_hash: String,
}

/// DTO for creating a user. The password arrives already hashed.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub department_id: Option<DbId>,
    pub specialization_id: Option<DbId>,
    pub profile: UserProfile,
}

/// Partial update of a user. Unset fields keep their stored value; profile
/// fields only apply to the matching role.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department_id: Option<DbId>,
    pub specialization_id: Option<DbId>,
    pub is_active: Option<bool>,
    pub student_number: Option<String>,
    pub promotion: Option<String>,
    pub expertise: Option<Vec<String>>,
    #[validate(range(min = 1, max = 20, message = "capacity must be between 1 and 20"))]
    pub max_project_capacity: Option<u32>,
}
