//! Typed wrappers over [`ApiClient`](crate::api::ApiClient), one per resource.
//!
//! Inputs that derive `Validate` are checked before the request is sent.
//! Scoped single-entity reads answer `Ok(None)` on 404.

pub mod admin;
pub mod auth;
pub mod defenses;
pub mod projects;

pub use admin::AdminService;
pub use auth::AuthService;
pub use defenses::DefenseService;
pub use projects::ProjectService;
