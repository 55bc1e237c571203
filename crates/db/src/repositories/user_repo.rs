//! Repository for the `users` table.

use chrono::Utc;
use pfehub_core::error::CoreError;
use pfehub_core::roles::Role;
use pfehub_core::types::DbId;
use pfehub_core::users::{User, UserProfile};
use sqlx::types::Json;

use crate::models::user::{user_columns, CreateUser, UpdateUser, UserRecord, UserRow};
use crate::{begin_write, next_id, DbConn, DbPool, DbResult};

pub struct UserRepo;

/// Load one user with its live supervision load.
pub(crate) async fn load(conn: &mut DbConn, id: DbId) -> DbResult<User> {
    let query = format!("SELECT {} FROM users u WHERE u.id = $1", user_columns());
    let row = sqlx::query_as::<_, UserRow>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })?;
    row.into_user()
}

/// Users holding `role`, ordered by last name.
pub(crate) async fn load_by_role(conn: &mut DbConn, role: Role) -> DbResult<Vec<User>> {
    let query = format!(
        "SELECT {} FROM users u WHERE u.role = $1 ORDER BY u.last_name, u.id",
        user_columns()
    );
    sqlx::query_as::<_, UserRow>(&query)
        .bind(role.as_str())
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(UserRow::into_user)
        .collect()
}

async fn ensure_department(conn: &mut DbConn, id: Option<DbId>) -> DbResult<()> {
    if let Some(id) = id {
        let found: Option<(DbId,)> = sqlx::query_as("SELECT id FROM departments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        if found.is_none() {
            return Err(CoreError::NotFound { entity: "Department", id }.into());
        }
    }
    Ok(())
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl UserRepo {
    /// Insert a user. Emails are unique, compared case-insensitively.
    pub async fn create(pool: &DbPool, input: CreateUser) -> DbResult<User> {
        let mut tx = begin_write(pool).await?;
        let email = input.email.trim().to_lowercase();
        let taken: Option<(DbId,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&mut *tx)
            .await?;
        if taken.is_some() {
            return Err(CoreError::Conflict(format!("A user with email {email} already exists")).into());
        }
        ensure_department(&mut tx, input.department_id).await?;

        let id = next_id(&mut tx, "users").await?;
        let role = match &input.profile {
            UserProfile::Student { .. } => Role::Student,
            UserProfile::Professor { .. } => Role::Professor,
            UserProfile::Admin { .. } => Role::Admin,
        };
        let (student_number, promotion, expertise, capacity, permissions) = match input.profile {
            UserProfile::Student { student_number, promotion } => {
                (Some(student_number), Some(promotion), None, None, None)
            }
            UserProfile::Professor { expertise, max_project_capacity, .. } => {
                (None, None, Some(Json(expertise)), Some(i64::from(max_project_capacity)), None)
            }
            UserProfile::Admin { permissions } => (None, None, None, None, Some(Json(permissions))),
        };

        sqlx::query(
            "INSERT INTO users
                (id, first_name, last_name, email, password_hash, role, department_id,
                 specialization_id, is_active, student_number, promotion, expertise,
                 max_project_capacity, permissions, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1, $9, $10, $11, $12, $13, $14)",
        )
        .bind(id)
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(&email)
        .bind(&input.password_hash)
        .bind(role.as_str())
        .bind(input.department_id)
        .bind(input.specialization_id)
        .bind(student_number)
        .bind(promotion)
        .bind(expertise)
        .bind(capacity)
        .bind(permissions)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let user = load(&mut tx, id).await?;
        tx.commit().await?;
        tracing::debug!(user_id = id, role = %role, "User created");
        Ok(user)
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> DbResult<User> {
        let mut conn = pool.acquire().await?;
        load(&mut conn, id).await
    }

    /// Lookup for login; includes the password hash.
    pub async fn find_by_email(pool: &DbPool, email: &str) -> DbResult<Option<UserRecord>> {
        let query = format!("SELECT {} FROM users u WHERE u.email = $1", user_columns());
        sqlx::query_as::<_, UserRow>(&query)
            .bind(email.trim())
            .fetch_optional(pool)
            .await?
            .map(UserRow::into_record)
            .transpose()
    }

    /// All users holding `role`, ordered by last name.
    pub async fn list_by_role(pool: &DbPool, role: Role) -> DbResult<Vec<User>> {
        let mut conn = pool.acquire().await?;
        load_by_role(&mut conn, role).await
    }

    /// Active professors still under capacity, least loaded first.
    pub async fn available_professors(pool: &DbPool) -> DbResult<Vec<User>> {
        let mut professors = Self::list_by_role(pool, Role::Professor).await?;
        professors.retain(|p| p.is_active && p.has_capacity());
        professors.sort_by_key(|p| p.workload().map(|(current, _)| current));
        Ok(professors)
    }

    /// Partial update. A professor's capacity cannot drop below the number
    /// of projects they currently supervise.
    pub async fn update(pool: &DbPool, id: DbId, input: &UpdateUser) -> DbResult<User> {
        let mut tx = begin_write(pool).await?;
        let current = load(&mut tx, id).await?;
        ensure_department(&mut tx, input.department_id).await?;

        if let (Some(requested), Some((supervised, _))) =
            (input.max_project_capacity, current.workload())
        {
            if requested < supervised {
                return Err(CoreError::Conflict(format!(
                    "Professor {} supervises {supervised} projects; capacity cannot be set to {requested}",
                    current.full_name()
                ))
                .into());
            }
        }

        let role = current.role();
        let only_for = |wanted: Role, value: Option<String>| value.filter(|_| role == wanted);
        sqlx::query(
            "UPDATE users SET
                first_name = COALESCE($1, first_name),
                last_name = COALESCE($2, last_name),
                department_id = COALESCE($3, department_id),
                specialization_id = COALESCE($4, specialization_id),
                is_active = COALESCE($5, is_active),
                student_number = COALESCE($6, student_number),
                promotion = COALESCE($7, promotion),
                expertise = COALESCE($8, expertise),
                max_project_capacity = COALESCE($9, max_project_capacity)
             WHERE id = $10",
        )
        .bind(trimmed(&input.first_name))
        .bind(trimmed(&input.last_name))
        .bind(input.department_id)
        .bind(input.specialization_id)
        .bind(input.is_active)
        .bind(only_for(Role::Student, trimmed(&input.student_number)))
        .bind(only_for(Role::Student, trimmed(&input.promotion)))
        .bind(input.expertise.clone().filter(|_| role == Role::Professor).map(Json))
        .bind(input.max_project_capacity.filter(|_| role == Role::Professor).map(i64::from))
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let user = load(&mut tx, id).await?;
        tx.commit().await?;
        Ok(user)
    }

    /// Delete an account that no project or defense refers to.
    pub async fn delete(pool: &DbPool, id: DbId) -> DbResult<()> {
        let mut tx = begin_write(pool).await?;
        let user = load(&mut tx, id).await?;
        let (references,): (i64,) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM projects WHERE student_id = $1 OR professor_id = $1)
                  + (SELECT COUNT(*) FROM defenses WHERE proposed_by = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if references > 0 {
            return Err(CoreError::Conflict(format!(
                "User {} is linked to existing projects and cannot be deleted",
                user.full_name()
            ))
            .into());
        }
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::ProjectRepo;
    use crate::test_support::{empty, seeded};
    use crate::DbError;
    use assert_matches::assert_matches;
    use pfehub_core::project::ProjectSubmission;
    use pfehub_core::roles::Actor;

    fn professor(email: &str) -> CreateUser {
        CreateUser {
            first_name: "Nadia".into(),
            last_name: "Tazi".into(),
            email: email.into(),
            password_hash: "hash".into(),
            department_id: None,
            specialization_id: None,
            profile: UserProfile::Professor {
                expertise: vec!["reseaux".into()],
                current_project_count: 3,
                max_project_capacity: 5,
            },
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let pool = empty().await;
        let user = UserRepo::create(&pool, professor("N.Tazi@univ.ma")).await.unwrap();
        assert_eq!(user.email, "n.tazi@univ.ma");
        // Load is derived from projects, not taken from input.
        assert_eq!(user.workload(), Some((0, 5)));
        assert_eq!(user.expertise(), ["reseaux".to_string()]);

        let record = UserRepo::find_by_email(&pool, "n.tazi@UNIV.ma")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.user.id, user.id);
        assert_eq!(record.password_hash, "hash");
        assert_eq!(UserRepo::list_by_role(&pool, Role::Professor).await.unwrap().len(), 1);
        assert!(UserRepo::list_by_role(&pool, Role::Student).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let pool = empty().await;
        UserRepo::create(&pool, professor("a@univ.ma")).await.unwrap();
        let err = UserRepo::create(&pool, professor("A@univ.ma")).await.unwrap_err();
        assert_matches!(err, DbError::Core(CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unknown_user_not_found() {
        let pool = empty().await;
        assert_matches!(
            UserRepo::find_by_id(&pool, 42).await,
            Err(DbError::Core(CoreError::NotFound { entity: "User", id: 42 }))
        );
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let pool = empty().await;
        let user = UserRepo::create(&pool, professor("t@univ.ma")).await.unwrap();
        let input = UpdateUser {
            last_name: Some("  Tazi-Amrani ".into()),
            max_project_capacity: Some(8),
            student_number: Some("E1".into()),
            ..Default::default()
        };
        let updated = UserRepo::update(&pool, user.id, &input).await.unwrap();
        assert_eq!(updated.last_name, "Tazi-Amrani");
        assert_eq!(updated.first_name, "Nadia");
        assert_eq!(updated.workload(), Some((0, 8)));
        assert_eq!(updated.expertise().len(), 1);
    }

    #[tokio::test]
    async fn test_capacity_cannot_drop_below_load() {
        let (pool, s) = seeded().await;
        let student = Actor::student(s.student_ids[0]);
        let p = ProjectRepo::submit(
            &pool,
            &student,
            &ProjectSubmission {
                title: "Portail".into(),
                description: "d".into(),
                objectives: "o".into(),
                context: None,
                methodology: None,
                expected_results: None,
                keywords: vec![],
            },
            None,
        )
        .await
        .unwrap();
        let assignment = pfehub_core::project::AssignmentInput {
            professor_id: s.professor_ids[0],
            notes: None,
        };
        ProjectRepo::assign(&pool, p.id, &Actor::admin(s.admin_id), &assignment)
            .await
            .unwrap();

        let input = UpdateUser {
            max_project_capacity: Some(0),
            ..Default::default()
        };
        let err = UserRepo::update(&pool, s.professor_ids[0], &input).await.unwrap_err();
        assert_matches!(err, DbError::Core(CoreError::Conflict(_)));

        // Linked accounts stay.
        let err = UserRepo::delete(&pool, s.student_ids[0]).await.unwrap_err();
        assert_matches!(err, DbError::Core(CoreError::Conflict(_)));
        UserRepo::delete(&pool, s.student_ids[2]).await.unwrap();
        assert!(UserRepo::find_by_id(&pool, s.student_ids[2]).await.is_err());
    }

    #[tokio::test]
    async fn test_available_professors_excludes_full_ones() {
        let (pool, s) = seeded().await;
        let fassi = s.professor_ids[2];
        UserRepo::update(
            &pool,
            fassi,
            &UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let available = UserRepo::available_professors(&pool).await.unwrap();
        assert_eq!(available.len(), 2);
        assert!(available.iter().all(|p| p.id != fassi));
    }
}
