//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `ADMIN` role.
//! - [`rbac::RequireProfessor`] -- Requires the `ENCADRANT` role.
//! - [`rbac::RequireStudent`] -- Requires the `ETUDIANT` role.

pub mod auth;
pub mod rbac;
