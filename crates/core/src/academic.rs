//! Academic structure: departments, specializations and academic years.
//!
//! At most one academic year is current at any time. When a current year
//! exists, its submission window gates project submission and its defense
//! window gates proposed defense dates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: DbId,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specialization {
    pub id: DbId,
    pub name: String,
    pub code: String,
    pub department_id: DbId,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYear {
    pub id: DbId,
    /// Label such as `2024-2025`.
    pub year: String,
    pub submission_start_date: NaiveDate,
    pub submission_end_date: NaiveDate,
    pub defense_start_date: NaiveDate,
    pub defense_end_date: NaiveDate,
    pub is_current: bool,
    pub created_at: Timestamp,
}

impl AcademicYear {
    pub fn accepts_submission_on(&self, day: NaiveDate) -> bool {
        day >= self.submission_start_date && day <= self.submission_end_date
    }

    pub fn accepts_defense_on(&self, day: NaiveDate) -> bool {
        day >= self.defense_start_date && day <= self.defense_end_date
    }
}

/* --------------------------------------------------------------------------
Inputs
-------------------------------------------------------------------------- */

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentInput {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "code must be 1-20 characters"))]
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SpecializationInput {
    #[validate(length(min = 1, max = 200, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 20, message = "code must be 1-20 characters"))]
    pub code: String,
    pub description: Option<String>,
    pub department_id: DbId,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYearInput {
    #[validate(length(min = 9, max = 9, message = "year must look like 2024-2025"))]
    pub year: String,
    pub submission_start_date: NaiveDate,
    pub submission_end_date: NaiveDate,
    pub defense_start_date: NaiveDate,
    pub defense_end_date: NaiveDate,
    #[serde(default)]
    pub is_current: bool,
}

impl AcademicYearInput {
    /// Field checks plus window ordering and the `YYYY-YYYY` label shape.
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()?;

        let mut parts = self.year.split('-');
        let consecutive = match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), None) => match (a.parse::<i32>(), b.parse::<i32>()) {
                (Ok(a), Ok(b)) => b == a + 1,
                _ => false,
            },
            _ => false,
        };
        if !consecutive {
            return Err(CoreError::field(
                "year",
                format!("Invalid academic year '{}'. Expected consecutive years like 2024-2025", self.year),
            ));
        }

        if self.submission_start_date > self.submission_end_date {
            return Err(CoreError::field(
                "submission_end_date",
                "submission window ends before it starts",
            ));
        }
        if self.defense_start_date > self.defense_end_date {
            return Err(CoreError::field(
                "defense_end_date",
                "defense window ends before it starts",
            ));
        }
        Ok(())
    }
}

/* --------------------------------------------------------------------------
Current-year invariant and windows
-------------------------------------------------------------------------- */

/// Make `target_id` the only current year. Returns `NotFound` when the id is
/// not among `years`, leaving every flag untouched.
pub fn activate(years: &mut [AcademicYear], target_id: DbId) -> Result<(), CoreError> {
    if !years.iter().any(|y| y.id == target_id) {
        return Err(CoreError::NotFound {
            entity: "AcademicYear",
            id: target_id,
        });
    }
    for year in years.iter_mut() {
        year.is_current = year.id == target_id;
    }
    Ok(())
}

pub fn current(years: &[AcademicYear]) -> Option<&AcademicYear> {
    years.iter().find(|y| y.is_current)
}

/// Submissions are open unless a current year exists and `day` falls
/// outside its submission window.
pub fn ensure_submission_open(
    current: Option<&AcademicYear>,
    day: NaiveDate,
) -> Result<(), CoreError> {
    match current {
        Some(year) if !year.accepts_submission_on(day) => Err(CoreError::Conflict(format!(
            "Project submissions for {} are accepted from {} to {}",
            year.year, year.submission_start_date, year.submission_end_date
        ))),
        _ => Ok(()),
    }
}

/// Same rule as [`ensure_submission_open`] for a proposed defense date.
pub fn ensure_defense_date_allowed(
    current: Option<&AcademicYear>,
    day: NaiveDate,
) -> Result<(), CoreError> {
    match current {
        Some(year) if !year.accepts_defense_on(day) => Err(CoreError::field(
            "proposed_date",
            format!(
                "Defenses for {} must be scheduled between {} and {}",
                year.year, year.defense_start_date, year.defense_end_date
            ),
        )),
        _ => Ok(()),
    }
}
