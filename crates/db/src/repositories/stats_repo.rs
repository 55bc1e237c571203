//! Dashboard aggregates over the whole database.

use chrono::NaiveDate;
use pfehub_core::roles::Role;
use pfehub_core::stats::{self, DashboardStats};

use crate::repositories::{academic_repo, defense_repo, project_repo, user_repo};
use crate::{DbPool, DbResult};

pub struct StatsRepo;

impl StatsRepo {
    /// Counts read from one snapshot.
    pub async fn dashboard(pool: &DbPool, today: NaiveDate) -> DbResult<DashboardStats> {
        let mut tx = pool.begin().await?;
        let mut users = user_repo::load_by_role(&mut tx, Role::Student).await?;
        users.extend(user_repo::load_by_role(&mut tx, Role::Professor).await?);
        let projects = project_repo::load_all(&mut tx).await?;
        let defenses = defense_repo::load_all(&mut tx).await?;
        let departments = academic_repo::load_departments(&mut tx).await?;
        tx.commit().await?;
        Ok(stats::compute(&users, &projects, &defenses, &departments, today))
    }
}
