//! Store of record for PFEHub, on SQLite through `sqlx`.
//!
//! Repository transitions run inside [`begin_write`]: the transaction's first
//! statement is a write, so SQLite hands out its write lock before the
//! transition reads the row it is about to change. Two racing requests
//! against the same entity are therefore serialized and the second one sees
//! the first one's result.

pub mod fixtures;
pub mod models;
pub mod repositories;

use std::str::FromStr;
use std::time::Duration;

use pfehub_core::error::CoreError;
use pfehub_core::types::DbId;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, Transaction};

pub type DbPool = sqlx::SqlitePool;

/// A connection borrowed from the pool or from an open transaction.
pub type DbConn = SqliteConnection;

pub type DbTransaction = Transaction<'static, Sqlite>;

/// Embedded schema migrations from `crates/db/migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// In-memory URL used by tests and throwaway servers.
pub const MEMORY_URL: &str = "sqlite::memory:";

const MAX_CONNECTIONS: u32 = 10;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Error type of every repository call: a domain refusal or a storage failure.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// The domain error, if this is one.
    pub fn core(&self) -> Option<&CoreError> {
        match self {
            DbError::Core(core) => Some(core),
            _ => None,
        }
    }

    /// See [`CoreError::is_precondition`].
    pub fn is_precondition(&self) -> bool {
        self.core().is_some_and(CoreError::is_precondition)
    }

    /// A stored value the domain types cannot represent.
    pub(crate) fn corrupt(entity: &'static str, id: DbId, detail: impl std::fmt::Display) -> Self {
        DbError::Core(CoreError::Internal(format!(
            "{entity} {id} has an invalid stored value: {detail}"
        )))
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Create a connection pool from a database URL (`sqlite://pfehub.db`,
/// `sqlite::memory:`). Missing database files are created.
///
/// An in-memory database lives as long as its connection, so it gets a
/// single connection that is never recycled.
pub async fn create_pool(database_url: &str) -> DbResult<DbPool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options.journal_mode(SqliteJournalMode::Wal))
            .await?
    };
    tracing::debug!(url = database_url, in_memory, "Database pool created");
    Ok(pool)
}

/// Apply pending migrations.
pub async fn run_migrations(pool: &DbPool) -> DbResult<()> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Pool with the schema in place, as the server and tests use it.
pub async fn connect(database_url: &str) -> DbResult<DbPool> {
    let pool = create_pool(database_url).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Round trip used by `/health`.
pub async fn health_check(pool: &DbPool) -> DbResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Open a transaction that already holds the database write lock.
pub async fn begin_write(pool: &DbPool) -> DbResult<DbTransaction> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE store_meta SET write_count = write_count + 1 WHERE id = 1")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

/// Next identifier for `table`. Only meaningful inside [`begin_write`].
pub(crate) async fn next_id(conn: &mut DbConn, table: &str) -> DbResult<DbId> {
    let query = format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {table}");
    let row: (DbId,) = sqlx::query_as(&query).fetch_one(conn).await?;
    Ok(row.0)
}

/// Stored counters are non-negative integers that fit the domain's `u32`.
pub(crate) fn to_u32(entity: &'static str, id: DbId, value: i64) -> DbResult<u32> {
    u32::try_from(value).map_err(|_| DbError::corrupt(entity, id, format!("counter {value}")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use pfehub_core::roles::Actor;

    use crate::fixtures;

    /// Fresh in-memory database with the schema applied.
    pub(crate) async fn empty() -> DbPool {
        connect(MEMORY_URL).await.expect("in-memory database")
    }

    /// In-memory database seeded with the demo fixtures.
    pub(crate) async fn seeded() -> (DbPool, fixtures::SeedSummary) {
        let pool = empty().await;
        let summary = fixtures::seed_demo_data(&pool, "hash")
            .await
            .expect("seed");
        (pool, summary)
    }

    pub(crate) fn admin(s: &fixtures::SeedSummary) -> Actor {
        Actor::admin(s.admin_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{ProjectRepo, UserRepo};
    use pfehub_core::project::ProjectSubmission;
    use pfehub_core::roles::Actor;

    #[tokio::test]
    async fn test_rows_survive_reopening_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("pfehub.db").display());

        let pool = connect(&url).await.unwrap();
        let seed = fixtures::seed_demo_data(&pool, "hash").await.unwrap();
        let submitted = ProjectRepo::submit(
            &pool,
            &Actor::student(seed.student_ids[0]),
            &ProjectSubmission {
                title: "Plateforme de suivi".into(),
                description: "d".into(),
                objectives: "o".into(),
                context: None,
                methodology: None,
                expected_results: None,
                keywords: vec!["web".into()],
            },
            None,
        )
        .await
        .unwrap();
        pool.close().await;

        let reopened = connect(&url).await.unwrap();
        let project = ProjectRepo::find_by_id(&reopened, submitted.id).await.unwrap();
        assert_eq!(project, submitted);
        let admin = UserRepo::find_by_email(&reopened, fixtures::ADMIN_EMAIL)
            .await
            .unwrap();
        assert!(admin.is_some());
    }

    #[tokio::test]
    async fn test_health_check_on_fresh_database() {
        let pool = test_support::empty().await;
        health_check(&pool).await.unwrap();
    }
}
