//! User roles and the acting principal passed to every transition.
//!
//! Wire names match the original portal (`ETUDIANT`, `ENCADRANT`, `ADMIN`)
//! and are also the role claim embedded in access tokens.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

pub const ROLE_STUDENT: &str = "ETUDIANT";
pub const ROLE_PROFESSOR: &str = "ENCADRANT";
pub const ROLE_ADMIN: &str = "ADMIN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ETUDIANT")]
    Student,
    #[serde(rename = "ENCADRANT")]
    Professor,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => ROLE_STUDENT,
            Role::Professor => ROLE_PROFESSOR,
            Role::Admin => ROLE_ADMIN,
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            ROLE_STUDENT => Ok(Role::Student),
            ROLE_PROFESSOR => Ok(Role::Professor),
            ROLE_ADMIN => Ok(Role::Admin),
            other => Err(CoreError::Validation(format!(
                "Invalid role '{other}'. Must be one of: {ROLE_STUDENT}, {ROLE_PROFESSOR}, {ROLE_ADMIN}"
            ))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated user on whose behalf a transition runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: DbId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: DbId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn student(user_id: DbId) -> Self {
        Self::new(user_id, Role::Student)
    }

    pub fn professor(user_id: DbId) -> Self {
        Self::new(user_id, Role::Professor)
    }

    pub fn admin(user_id: DbId) -> Self {
        Self::new(user_id, Role::Admin)
    }

    /// Reject unless the actor holds `role`. `action` reads like
    /// "assign a project" and ends up in the error message.
    pub fn require(&self, role: Role, action: &str) -> Result<(), CoreError> {
        if self.role == role {
            Ok(())
        } else {
            Err(CoreError::Forbidden(format!(
                "Only {role} users can {action} (caller is {})",
                self.role
            )))
        }
    }
}
