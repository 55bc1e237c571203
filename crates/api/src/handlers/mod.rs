//! Request handlers, one submodule per resource.
//!
//! Handlers authenticate through the extractors in [`crate::middleware`],
//! delegate to the repositories in `pfehub_db` and wrap results in
//! [`crate::response::DataResponse`].

pub mod academic;
pub mod auth;
pub mod dashboard;
pub mod defense;
pub mod deliverable;
pub mod files;
pub mod project;
pub mod users;
