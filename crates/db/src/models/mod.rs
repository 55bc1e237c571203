//! Row models and DTOs.
//!
//! Domain entities live in `pfehub-core`. Each `*Row` here mirrors one table
//! (statuses as text, tag lists and file references as JSON) and converts
//! into its domain type, failing on stored values the domain rejects.

pub mod academic;
pub mod defense;
pub mod deliverable;
pub mod project;
pub mod user;
