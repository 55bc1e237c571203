//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&DbPool` as the first argument. Transitions run in a write
//! transaction from the first read to the final write.

pub mod academic_repo;
pub mod defense_repo;
pub mod deliverable_repo;
pub mod project_repo;
pub mod stats_repo;
pub mod user_repo;

pub use academic_repo::AcademicRepo;
pub use defense_repo::DefenseRepo;
pub use deliverable_repo::DeliverableRepo;
pub use project_repo::ProjectRepo;
pub use stats_repo::StatsRepo;
pub use user_repo::UserRepo;
