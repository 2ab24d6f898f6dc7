//! Tracker repository implementation.

use sqlx::PgPool;

use cubby_core::error::{AppError, ErrorKind};
use cubby_core::result::AppResult;
use cubby_core::types::notification::TrackerLastEntry;

/// Repository for tracker reads used by the reminder pass.
#[derive(Debug, Clone)]
pub struct TrackerRepository {
    pool: PgPool,
}

impl TrackerRepository {
    /// Create a new tracker repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List every tracker that has at least one entry, joined with its most
    /// recent entry.
    ///
    /// The interval reported is the one captured on that entry. Ties on
    /// `performed_at` resolve to the most recently created entry.
    pub async fn list_with_latest_entry(&self) -> AppResult<Vec<TrackerLastEntry>> {
        sqlx::query_as::<_, TrackerLastEntry>(
            "SELECT DISTINCT ON (t.id) \
                 t.id AS tracker_id, \
                 t.family_id, \
                 t.display AS name, \
                 e.performed_at AS last_performed_at, \
                 e.interval AS applied_interval, \
                 e.interval_unit AS applied_unit \
             FROM trackers t \
             JOIN entries e ON e.tracker_id = t.id \
             ORDER BY t.id, e.performed_at DESC, e.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                "Failed to list trackers with latest entry",
                e,
            )
        })
    }
}
