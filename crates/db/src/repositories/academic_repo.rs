//! Repository for departments, specializations and academic years.

use chrono::Utc;
use pfehub_core::academic::{
    self, AcademicYear, AcademicYearInput, Department, DepartmentInput, Specialization,
    SpecializationInput,
};
use pfehub_core::error::CoreError;
use pfehub_core::types::DbId;
use validator::Validate;

use crate::models::academic::{
    AcademicYearRow, DepartmentRow, SpecializationRow, UpdateAcademicYear, UpdateDepartment,
    UpdateSpecialization, ACADEMIC_YEAR_COLUMNS, DEPARTMENT_COLUMNS, SPECIALIZATION_COLUMNS,
};
use crate::{begin_write, next_id, DbConn, DbPool, DbResult};

pub struct AcademicRepo;

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn load_department(conn: &mut DbConn, id: DbId) -> DbResult<Department> {
    let query = format!("SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = $1");
    let row = sqlx::query_as::<_, DepartmentRow>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(CoreError::NotFound { entity: "Department", id })?;
    Ok(row.into())
}

async fn load_specialization(conn: &mut DbConn, id: DbId) -> DbResult<Specialization> {
    let query = format!("SELECT {SPECIALIZATION_COLUMNS} FROM specializations WHERE id = $1");
    let row = sqlx::query_as::<_, SpecializationRow>(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(CoreError::NotFound { entity: "Specialization", id })?;
    Ok(row.into())
}

pub(crate) async fn load_departments(conn: &mut DbConn) -> DbResult<Vec<Department>> {
    let query = format!("SELECT {DEPARTMENT_COLUMNS} FROM departments ORDER BY id");
    Ok(sqlx::query_as::<_, DepartmentRow>(&query)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(Department::from)
        .collect())
}

/// Every year, most recent first.
pub(crate) async fn load_years(conn: &mut DbConn) -> DbResult<Vec<AcademicYear>> {
    let query = format!("SELECT {ACADEMIC_YEAR_COLUMNS} FROM academic_years ORDER BY year DESC");
    Ok(sqlx::query_as::<_, AcademicYearRow>(&query)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(AcademicYear::from)
        .collect())
}

pub(crate) async fn load_current_year(conn: &mut DbConn) -> DbResult<Option<AcademicYear>> {
    let query =
        format!("SELECT {ACADEMIC_YEAR_COLUMNS} FROM academic_years WHERE is_current = 1");
    Ok(sqlx::query_as::<_, AcademicYearRow>(&query)
        .fetch_optional(&mut *conn)
        .await?
        .map(AcademicYear::from))
}

/// Code uniqueness among rows other than `exclude`.
async fn ensure_code_free(
    conn: &mut DbConn,
    table: &str,
    label: &str,
    code: &str,
    exclude: Option<DbId>,
) -> DbResult<()> {
    let query = format!("SELECT id FROM {table} WHERE code = $1 AND id != $2");
    let taken: Option<(DbId,)> = sqlx::query_as(&query)
        .bind(code)
        .bind(exclude.unwrap_or(0))
        .fetch_optional(&mut *conn)
        .await?;
    if taken.is_some() {
        return Err(CoreError::Conflict(format!("{label} code {code} is already in use")).into());
    }
    Ok(())
}

/// Refuse to delete a row still referenced from `checks` (`table`, `column`).
async fn ensure_unreferenced(
    conn: &mut DbConn,
    label: &str,
    id: DbId,
    checks: &[(&str, &str)],
) -> DbResult<()> {
    for (table, column) in checks {
        let query = format!("SELECT COUNT(*) FROM {table} WHERE {column} = $1");
        let (count,): (i64,) = sqlx::query_as(&query).bind(id).fetch_one(&mut *conn).await?;
        if count > 0 {
            return Err(CoreError::Conflict(format!(
                "{label} {id} is still referenced by {count} {table}"
            ))
            .into());
        }
    }
    Ok(())
}

/// Rewrite the `is_current` flags after [`academic::activate`].
async fn store_current_flags(conn: &mut DbConn, years: &[AcademicYear]) -> DbResult<()> {
    // Clear first so the partial unique index never sees two current rows.
    sqlx::query("UPDATE academic_years SET is_current = 0 WHERE is_current = 1")
        .execute(&mut *conn)
        .await?;
    if let Some(year) = academic::current(years) {
        sqlx::query("UPDATE academic_years SET is_current = 1 WHERE id = $1")
            .bind(year.id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

impl AcademicRepo {
    /// Department codes are unique, case-insensitively.
    pub async fn create_department(pool: &DbPool, input: &DepartmentInput) -> DbResult<Department> {
        input.validate().map_err(CoreError::from)?;
        let code = input.code.trim().to_uppercase();
        let mut tx = begin_write(pool).await?;
        ensure_code_free(&mut tx, "departments", "Department", &code, None).await?;

        let id = next_id(&mut tx, "departments").await?;
        sqlx::query(
            "INSERT INTO departments (id, name, code, description, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&code)
        .bind(trimmed(&input.description))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        let department = load_department(&mut tx, id).await?;
        tx.commit().await?;
        Ok(department)
    }

    pub async fn list_departments(pool: &DbPool) -> DbResult<Vec<Department>> {
        let mut conn = pool.acquire().await?;
        load_departments(&mut conn).await
    }

    pub async fn update_department(
        pool: &DbPool,
        id: DbId,
        input: &UpdateDepartment,
    ) -> DbResult<Department> {
        let mut tx = begin_write(pool).await?;
        load_department(&mut tx, id).await?;
        let code = trimmed(&input.code).map(|c| c.to_uppercase());
        if let Some(code) = &code {
            ensure_code_free(&mut tx, "departments", "Department", code, Some(id)).await?;
        }
        sqlx::query(
            "UPDATE departments SET
                name = COALESCE($1, name),
                code = COALESCE($2, code),
                description = COALESCE($3, description)
             WHERE id = $4",
        )
        .bind(trimmed(&input.name))
        .bind(code)
        .bind(trimmed(&input.description))
        .bind(id)
        .execute(&mut *tx)
        .await?;
        let department = load_department(&mut tx, id).await?;
        tx.commit().await?;
        Ok(department)
    }

    /// Departments with specializations or members cannot be deleted.
    pub async fn delete_department(pool: &DbPool, id: DbId) -> DbResult<()> {
        let mut tx = begin_write(pool).await?;
        load_department(&mut tx, id).await?;
        ensure_unreferenced(
            &mut tx,
            "Department",
            id,
            &[("specializations", "department_id"), ("users", "department_id")],
        )
        .await?;
        sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::info!(department_id = id, "Department deleted");
        Ok(())
    }

    /// A specialization always belongs to an existing department.
    pub async fn create_specialization(
        pool: &DbPool,
        input: &SpecializationInput,
    ) -> DbResult<Specialization> {
        input.validate().map_err(CoreError::from)?;
        let code = input.code.trim().to_uppercase();
        let mut tx = begin_write(pool).await?;
        load_department(&mut tx, input.department_id).await?;
        ensure_code_free(&mut tx, "specializations", "Specialization", &code, None).await?;

        let id = next_id(&mut tx, "specializations").await?;
        sqlx::query(
            "INSERT INTO specializations (id, name, code, department_id, description, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&code)
        .bind(input.department_id)
        .bind(trimmed(&input.description))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        let specialization = load_specialization(&mut tx, id).await?;
        tx.commit().await?;
        Ok(specialization)
    }

    pub async fn list_specializations(
        pool: &DbPool,
        department_id: Option<DbId>,
    ) -> DbResult<Vec<Specialization>> {
        let query = format!(
            "SELECT {SPECIALIZATION_COLUMNS} FROM specializations
             WHERE ($1 IS NULL OR department_id = $1)
             ORDER BY id"
        );
        Ok(sqlx::query_as::<_, SpecializationRow>(&query)
            .bind(department_id)
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(Specialization::from)
            .collect())
    }

    pub async fn update_specialization(
        pool: &DbPool,
        id: DbId,
        input: &UpdateSpecialization,
    ) -> DbResult<Specialization> {
        let mut tx = begin_write(pool).await?;
        load_specialization(&mut tx, id).await?;
        if let Some(department_id) = input.department_id {
            load_department(&mut tx, department_id).await?;
        }
        let code = trimmed(&input.code).map(|c| c.to_uppercase());
        if let Some(code) = &code {
            ensure_code_free(&mut tx, "specializations", "Specialization", code, Some(id)).await?;
        }
        sqlx::query(
            "UPDATE specializations SET
                name = COALESCE($1, name),
                code = COALESCE($2, code),
                description = COALESCE($3, description),
                department_id = COALESCE($4, department_id)
             WHERE id = $5",
        )
        .bind(trimmed(&input.name))
        .bind(code)
        .bind(trimmed(&input.description))
        .bind(input.department_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        let specialization = load_specialization(&mut tx, id).await?;
        tx.commit().await?;
        Ok(specialization)
    }

    /// Specializations held by a user cannot be deleted.
    pub async fn delete_specialization(pool: &DbPool, id: DbId) -> DbResult<()> {
        let mut tx = begin_write(pool).await?;
        load_specialization(&mut tx, id).await?;
        ensure_unreferenced(&mut tx, "Specialization", id, &[("users", "specialization_id")])
            .await?;
        sqlx::query("DELETE FROM specializations WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Create a year; when flagged current, every other year is cleared in
    /// the same transaction.
    pub async fn create_year(pool: &DbPool, input: &AcademicYearInput) -> DbResult<AcademicYear> {
        input.check()?;
        let mut tx = begin_write(pool).await?;
        let mut years = load_years(&mut tx).await?;
        if years.iter().any(|y| y.year == input.year) {
            return Err(
                CoreError::Conflict(format!("Academic year {} already exists", input.year)).into(),
            );
        }

        let id = next_id(&mut tx, "academic_years").await?;
        let created = AcademicYear {
            id,
            year: input.year.clone(),
            submission_start_date: input.submission_start_date,
            submission_end_date: input.submission_end_date,
            defense_start_date: input.defense_start_date,
            defense_end_date: input.defense_end_date,
            is_current: false,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO academic_years
                (id, year, submission_start_date, submission_end_date,
                 defense_start_date, defense_end_date, is_current, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, 0, $7)",
        )
        .bind(id)
        .bind(&created.year)
        .bind(created.submission_start_date)
        .bind(created.submission_end_date)
        .bind(created.defense_start_date)
        .bind(created.defense_end_date)
        .bind(created.created_at)
        .execute(&mut *tx)
        .await?;

        years.push(created);
        if input.is_current {
            academic::activate(&mut years, id)?;
            store_current_flags(&mut tx, &years).await?;
        }
        let stored = years
            .into_iter()
            .find(|y| y.id == id)
            .ok_or(CoreError::Internal(format!("academic year {id} vanished")))?;
        tx.commit().await?;
        Ok(stored)
    }

    /// Most recent first.
    pub async fn list_years(pool: &DbPool) -> DbResult<Vec<AcademicYear>> {
        let mut conn = pool.acquire().await?;
        load_years(&mut conn).await
    }

    pub async fn current_year(pool: &DbPool) -> DbResult<Option<AcademicYear>> {
        let mut conn = pool.acquire().await?;
        load_current_year(&mut conn).await
    }

    pub async fn activate_year(pool: &DbPool, id: DbId) -> DbResult<AcademicYear> {
        let mut tx = begin_write(pool).await?;
        let mut years = load_years(&mut tx).await?;
        academic::activate(&mut years, id)?;
        store_current_flags(&mut tx, &years).await?;
        let current = load_current_year(&mut tx)
            .await?
            .ok_or(CoreError::Internal(format!("academic year {id} not current after activation")))?;
        tx.commit().await?;
        tracing::info!(academic_year = %current.year, "Academic year activated");
        Ok(current)
    }

    /// Partial update of the windows, rechecked as a whole. Setting
    /// `is_current` activates the year; clearing it leaves no current year.
    pub async fn update_year(
        pool: &DbPool,
        id: DbId,
        input: &UpdateAcademicYear,
    ) -> DbResult<AcademicYear> {
        let mut tx = begin_write(pool).await?;
        let mut years = load_years(&mut tx).await?;
        let existing = years
            .iter()
            .find(|y| y.id == id)
            .cloned()
            .ok_or(CoreError::NotFound { entity: "AcademicYear", id })?;

        let merged = AcademicYearInput {
            year: existing.year.clone(),
            submission_start_date: input.submission_start_date.unwrap_or(existing.submission_start_date),
            submission_end_date: input.submission_end_date.unwrap_or(existing.submission_end_date),
            defense_start_date: input.defense_start_date.unwrap_or(existing.defense_start_date),
            defense_end_date: input.defense_end_date.unwrap_or(existing.defense_end_date),
            is_current: input.is_current.unwrap_or(existing.is_current),
        };
        merged.check()?;

        sqlx::query(
            "UPDATE academic_years SET
                submission_start_date = $1,
                submission_end_date = $2,
                defense_start_date = $3,
                defense_end_date = $4
             WHERE id = $5",
        )
        .bind(merged.submission_start_date)
        .bind(merged.submission_end_date)
        .bind(merged.defense_start_date)
        .bind(merged.defense_end_date)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        match input.is_current {
            Some(true) => {
                academic::activate(&mut years, id)?;
                store_current_flags(&mut tx, &years).await?;
            }
            Some(false) => {
                sqlx::query("UPDATE academic_years SET is_current = 0 WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            None => {}
        }

        let query = format!("SELECT {ACADEMIC_YEAR_COLUMNS} FROM academic_years WHERE id = $1");
        let updated: AcademicYear = sqlx::query_as::<_, AcademicYearRow>(&query)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?
            .into();
        tx.commit().await?;
        Ok(updated)
    }

    /// The current year cannot be deleted.
    pub async fn delete_year(pool: &DbPool, id: DbId) -> DbResult<()> {
        let mut tx = begin_write(pool).await?;
        let years = load_years(&mut tx).await?;
        let year = years
            .iter()
            .find(|y| y.id == id)
            .ok_or(CoreError::NotFound { entity: "AcademicYear", id })?;
        if year.is_current {
            return Err(CoreError::Conflict(format!(
                "Academic year {} is current; activate another year first",
                year.year
            ))
            .into());
        }
        sqlx::query("DELETE FROM academic_years WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{empty, seeded};
    use crate::DbError;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn year(label: &str, current: bool) -> AcademicYearInput {
        AcademicYearInput {
            year: label.into(),
            submission_start_date: d("2024-10-01"),
            submission_end_date: d("2025-01-31"),
            defense_start_date: d("2025-06-01"),
            defense_end_date: d("2025-07-31"),
            is_current: current,
        }
    }

    #[tokio::test]
    async fn test_single_current_year() {
        let pool = empty().await;
        let first = AcademicRepo::create_year(&pool, &year("2024-2025", true)).await.unwrap();
        let second = AcademicRepo::create_year(&pool, &year("2025-2026", true)).await.unwrap();
        assert!(second.is_current);
        let years = AcademicRepo::list_years(&pool).await.unwrap();
        assert_eq!(years.iter().filter(|y| y.is_current).count(), 1);
        assert_eq!(years[0].year, "2025-2026");

        AcademicRepo::activate_year(&pool, first.id).await.unwrap();
        assert_eq!(AcademicRepo::current_year(&pool).await.unwrap().unwrap().id, first.id);
    }

    #[tokio::test]
    async fn test_specialization_requires_department() {
        let pool = empty().await;
        let err = AcademicRepo::create_specialization(
            &pool,
            &SpecializationInput {
                name: "Génie Logiciel".into(),
                code: "gl".into(),
                description: None,
                department_id: 7,
            },
        )
        .await
        .unwrap_err();
        assert_matches!(err, DbError::Core(CoreError::NotFound { entity: "Department", id: 7 }));
    }

    #[tokio::test]
    async fn test_department_codes_unique() {
        let pool = empty().await;
        let input = DepartmentInput {
            name: "Informatique".into(),
            code: "gi".into(),
            description: Some("  ".into()),
        };
        let d = AcademicRepo::create_department(&pool, &input).await.unwrap();
        assert_eq!(d.code, "GI");
        assert_eq!(d.description, None);
        assert_matches!(
            AcademicRepo::create_department(&pool, &input).await,
            Err(DbError::Core(CoreError::Conflict(_)))
        );
    }

    #[tokio::test]
    async fn test_department_update_and_guarded_delete() {
        let (pool, s) = seeded().await;
        let renamed = AcademicRepo::update_department(
            &pool,
            s.department_ids[1],
            &UpdateDepartment {
                name: Some("Génie Civil et Environnement".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "Génie Civil et Environnement");
        assert_eq!(renamed.code, "GC");

        let clash = AcademicRepo::update_department(
            &pool,
            s.department_ids[1],
            &UpdateDepartment {
                code: Some("gi".into()),
                ..Default::default()
            },
        )
        .await;
        assert_matches!(clash, Err(DbError::Core(CoreError::Conflict(_))));

        let err = AcademicRepo::delete_department(&pool, s.department_ids[0]).await.unwrap_err();
        assert_matches!(err, DbError::Core(CoreError::Conflict(_)));

        let empty_department = AcademicRepo::create_department(
            &pool,
            &DepartmentInput {
                name: "Mathématiques".into(),
                code: "MA".into(),
                description: None,
            },
        )
        .await
        .unwrap();
        AcademicRepo::delete_department(&pool, empty_department.id).await.unwrap();
        assert_eq!(AcademicRepo::list_departments(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_year_update_rechecks_windows_and_moves_current_flag() {
        let (pool, s) = seeded().await;
        let other = AcademicRepo::create_year(&pool, &year("2025-2026", true)).await.unwrap();

        let bad = UpdateAcademicYear {
            defense_end_date: Some(d("2025-05-01")),
            ..Default::default()
        };
        assert_matches!(
            AcademicRepo::update_year(&pool, s.academic_year_id, &bad).await,
            Err(DbError::Core(CoreError::InvalidFields(_)))
        );

        let activate = UpdateAcademicYear {
            defense_end_date: Some(d("2025-08-15")),
            is_current: Some(true),
            ..Default::default()
        };
        let updated = AcademicRepo::update_year(&pool, s.academic_year_id, &activate)
            .await
            .unwrap();
        assert!(updated.is_current);
        assert_eq!(updated.defense_end_date, d("2025-08-15"));

        let years = AcademicRepo::list_years(&pool).await.unwrap();
        assert!(!years.iter().find(|y| y.id == other.id).unwrap().is_current);

        assert_matches!(
            AcademicRepo::delete_year(&pool, s.academic_year_id).await,
            Err(DbError::Core(CoreError::Conflict(_)))
        );
        AcademicRepo::delete_year(&pool, other.id).await.unwrap();
        assert_eq!(AcademicRepo::list_years(&pool).await.unwrap().len(), 1);
    }
}
