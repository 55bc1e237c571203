use std::sync::Arc;

use pfehub_core::recommendation::ScoringStrategy;

use crate::config::ServerConfig;
use crate::storage::FileStorage;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool.
    pub pool: pfehub_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Upload directory for proposals, final reports and deliverables.
    pub storage: Arc<FileStorage>,
    /// Scoring used by the assignment recommender.
    pub scoring: Arc<dyn ScoringStrategy>,
}
