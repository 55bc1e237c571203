//! Domain core for the PFEHub final-year-project portal.
//!
//! Everything in this crate is pure: entity types, the project and defense
//! lifecycle state machines with their role guards, input validation, the
//! assignment recommender and the schedule conflict check. The store (`db`),
//! the HTTP server (`api`) and the client library all call into these
//! functions so every layer enforces the same rules.

pub mod academic;
pub mod conflict;
pub mod defense;
pub mod deliverable;
pub mod error;
pub mod evaluation;
pub mod hashing;
pub mod jury;
pub mod project;
pub mod recommendation;
pub mod roles;
pub mod schedule;
pub mod stats;
pub mod types;
pub mod users;
