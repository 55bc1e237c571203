//! Department, specialization and academic year rows and DTOs.

use chrono::NaiveDate;
use pfehub_core::academic::{AcademicYear, Department, Specialization};
use pfehub_core::types::{DbId, Timestamp};
use serde::Deserialize;
use sqlx::FromRow;

pub const DEPARTMENT_COLUMNS: &str = "id, name, code, description, created_at";

pub const SPECIALIZATION_COLUMNS: &str =
    "id, name, code, department_id, description, created_at";

pub const ACADEMIC_YEAR_COLUMNS: &str = "id, year, submission_start_date, submission_end_date, \
    defense_start_date, defense_end_date, is_current, created_at";

#[derive(Debug, Clone, FromRow)]
pub struct DepartmentRow {
    pub id: DbId,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

impl From<DepartmentRow> for Department {
    fn from(row: DepartmentRow) -> Self {
        Department {
            id: row.id,
            name: row.name,
            code: row.code,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SpecializationRow {
    pub id: DbId,
    pub name: String,
    pub code: String,
    pub department_id: DbId,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

impl From<SpecializationRow> for Specialization {
    fn from(row: SpecializationRow) -> Self {
        Specialization {
            id: row.id,
            name: row.name,
            code: row.code,
            department_id: row.department_id,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AcademicYearRow {
    pub id: DbId,
    pub year: String,
    pub submission_start_date: NaiveDate,
    pub submission_end_date: NaiveDate,
    pub defense_start_date: NaiveDate,
    pub defense_end_date: NaiveDate,
    pub is_current: bool,
    pub created_at: Timestamp,
}

impl From<AcademicYearRow> for AcademicYear {
    fn from(row: AcademicYearRow) -> Self {
        AcademicYear {
            id: row.id,
            year: row.year,
            submission_start_date: row.submission_start_date,
            submission_end_date: row.submission_end_date,
            defense_start_date: row.defense_start_date,
            defense_end_date: row.defense_end_date,
            is_current: row.is_current,
            created_at: row.created_at,
        }
    }
}

/// Partial update of a department.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartment {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
}

/// Partial update of a specialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSpecialization {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub department_id: Option<DbId>,
}

/// Partial update of an academic year. Setting `is_current` to true clears
/// the flag on every other year.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAcademicYear {
    pub submission_start_date: Option<NaiveDate>,
    pub submission_end_date: Option<NaiveDate>,
    pub defense_start_date: Option<NaiveDate>,
    pub defense_end_date: Option<NaiveDate>,
    pub is_current: Option<bool>,
}
