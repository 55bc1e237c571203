//! Admin dashboard counters.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::academic::Department;
use crate::defense::{Defense, DefenseStatus};
use crate::project::{Project, ProjectStatus};
use crate::roles::Role;
use crate::types::DbId;
use crate::users::User;

/// Bucket for projects whose student has no department.
pub const NO_DEPARTMENT: &str = "Sans département";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: usize,
    pub total_professors: usize,
    pub active_projects: usize,
    pub pending_assignments: usize,
    pub upcoming_defenses: usize,
    pub pending_defenses: usize,
    pub projects_by_status: BTreeMap<ProjectStatus, usize>,
    pub projects_by_department: BTreeMap<String, usize>,
}

/// Neither refused nor finished.
pub fn is_active(project: &Project) -> bool {
    !matches!(
        project.status,
        ProjectStatus::Rejected | ProjectStatus::Evaluated
    )
}

/// Scheduled on or after `today` and not yet evaluated.
pub fn is_upcoming(defense: &Defense, today: NaiveDate) -> bool {
    defense.evaluation.is_none()
        && defense
            .scheduled_slot()
            .is_some_and(|slot| slot.date >= today)
}

pub fn compute(
    users: &[User],
    projects: &[Project],
    defenses: &[Defense],
    departments: &[Department],
    today: NaiveDate,
) -> DashboardStats {
    let department_names: HashMap<DbId, &str> =
        departments.iter().map(|d| (d.id, d.name.as_str())).collect();
    let student_departments: HashMap<DbId, Option<DbId>> = users
        .iter()
        .filter(|u| u.role() == Role::Student)
        .map(|u| (u.id, u.department_id))
        .collect();

    let mut stats = DashboardStats {
        total_students: users.iter().filter(|u| u.role() == Role::Student).count(),
        total_professors: users.iter().filter(|u| u.role() == Role::Professor).count(),
        ..Default::default()
    };

    for project in projects {
        *stats.projects_by_status.entry(project.status).or_default() += 1;
        if is_active(project) {
            stats.active_projects += 1;
        }
        if project.status == ProjectStatus::PendingAssignment {
            stats.pending_assignments += 1;
        }
        let department = student_departments
            .get(&project.student_id)
            .copied()
            .flatten()
            .and_then(|id| department_names.get(&id).copied())
            .unwrap_or(NO_DEPARTMENT);
        *stats
            .projects_by_department
            .entry(department.to_string())
            .or_default() += 1;
    }

    for defense in defenses {
        if is_upcoming(defense, today) {
            stats.upcoming_defenses += 1;
        }
        if defense.status() == DefenseStatus::Proposed {
            stats.pending_defenses += 1;
        }
    }

    stats
}

/// Defense counters for the scheduling overview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefenseStats {
    pub total: usize,
    /// Proposals awaiting an admin decision.
    pub pending: usize,
    /// Validated or modified, graded or not.
    pub scheduled: usize,
    pub postponed: usize,
    pub evaluated: usize,
    pub upcoming: usize,
}

pub fn defense_counts(defenses: &[Defense], today: NaiveDate) -> DefenseStats {
    let mut stats = DefenseStats {
        total: defenses.len(),
        ..Default::default()
    };
    for defense in defenses {
        match defense.status() {
            DefenseStatus::Proposed => stats.pending += 1,
            DefenseStatus::Validated | DefenseStatus::Modified => stats.scheduled += 1,
            DefenseStatus::Postponed => stats.postponed += 1,
        }
        if defense.evaluation.is_some() {
            stats.evaluated += 1;
        }
        if is_upcoming(defense, today) {
            stats.upcoming += 1;
        }
    }
    stats
}
