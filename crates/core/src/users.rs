//! User accounts: a shared base plus a role-specific profile.

use serde::{Deserialize, Serialize};

use crate::roles::Role;
use crate::types::{DbId, Timestamp};

/// Capacity given to professors created without an explicit limit.
pub const DEFAULT_MAX_PROJECT_CAPACITY: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: Option<DbId>,
    pub specialization_id: Option<DbId>,
    pub is_active: bool,
    pub created_at: Timestamp,
    #[serde(flatten)]
    pub profile: UserProfile,
}

/// Role-specific attributes. The `role` tag doubles as the user's role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role")]
pub enum UserProfile {
    #[serde(rename = "ETUDIANT", rename_all = "camelCase")]
    Student {
        student_number: String,
        promotion: String,
    },
    #[serde(rename = "ENCADRANT", rename_all = "camelCase")]
    Professor {
        expertise: Vec<String>,
        /// Projects currently supervised; computed by the store on read.
        current_project_count: u32,
        max_project_capacity: u32,
    },
    #[serde(rename = "ADMIN", rename_all = "camelCase")]
    Admin { permissions: Vec<String> },
}

impl User {
    pub fn role(&self) -> Role {
        match self.profile {
            UserProfile::Student { .. } => Role::Student,
            UserProfile::Professor { .. } => Role::Professor,
            UserProfile::Admin { .. } => Role::Admin,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Expertise tags for professors, empty for everyone else.
    pub fn expertise(&self) -> &[String] {
        match &self.profile {
            UserProfile::Professor { expertise, .. } => expertise,
            _ => &[],
        }
    }

    /// `(current, max)` supervision load for professors.
    pub fn workload(&self) -> Option<(u32, u32)> {
        match self.profile {
            UserProfile::Professor {
                current_project_count,
                max_project_capacity,
                ..
            } => Some((current_project_count, max_project_capacity)),
            _ => None,
        }
    }

    /// A professor can take another project while under capacity.
    pub fn has_capacity(&self) -> bool {
        matches!(self.workload(), Some((current, max)) if current < max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn professor(current: u32, max: u32) -> User {
        User {
            id: 7,
            first_name: "Karim".into(),
            last_name: "Alaoui".into(),
            email: "k.alaoui@univ.ma".into(),
            department_id: Some(1),
            specialization_id: Some(2),
            is_active: true,
            created_at: Utc::now(),
            profile: UserProfile::Professor {
                expertise: vec!["machine learning".into(), "nlp".into()],
                current_project_count: current,
                max_project_capacity: max,
            },
        }
    }

    #[test]
    fn role_is_derived_from_profile() {
        assert_eq!(professor(0, 5).role(), Role::Professor);
    }

    #[test]
    fn capacity_check_is_strict() {
        assert!(professor(4, 5).has_capacity());
        assert!(!professor(5, 5).has_capacity());
    }

    #[test]
    fn profile_is_flattened_with_role_tag() {
        let json = serde_json::to_value(professor(1, 5)).unwrap();
        assert_eq!(json["role"], "ENCADRANT");
        assert_eq!(json["maxProjectCapacity"], 5);
        assert_eq!(json["currentProjectCount"], 1);
        assert_eq!(json["firstName"], "Karim");

        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back.role(), Role::Professor);
        assert_eq!(back.expertise().len(), 2);
    }

    #[test]
    fn non_professors_have_no_workload() {
        let mut user = professor(0, 5);
        user.profile = UserProfile::Admin {
            permissions: vec!["ALL".into()],
        };
        assert_eq!(user.workload(), None);
        assert!(!user.has_capacity());
        assert!(user.expertise().is_empty());
    }
}
