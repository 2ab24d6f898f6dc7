//! Storage collaborator consumed by the reminder worker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::result::AppResult;
use crate::types::id::{TrackerId, UserId};
use crate::types::notification::{EligibleRecipient, TrackerLastEntry};

/// Reads trackers and recipients, and writes the notification ledger.
///
/// Two implementations are provided:
/// - PostgreSQL (`cubby-database::store::PgNotificationStore`)
/// - In-memory (`cubby-database::memory::MemoryNotificationStore`)
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// List every tracker that has at least one entry, joined with its
    /// most recent entry by `performed_at`.
    async fn list_trackers_with_latest_entry(&self) -> AppResult<Vec<TrackerLastEntry>>;

    /// Expand the given trackers into (token, user, tracker) triples for
    /// the family owner and every family member holding a registered token.
    ///
    /// A (tracker, user) pair whose ledger row was written at or after
    /// `cooldown_threshold` is excluded.
    async fn list_eligible_recipients(
        &self,
        tracker_ids: &[TrackerId],
        cooldown_threshold: DateTime<Utc>,
    ) -> AppResult<Vec<EligibleRecipient>>;

    /// Insert or update the ledger row for (tracker, user), setting
    /// `last_notified_at = now`.
    async fn upsert_notification_log(
        &self,
        tracker_id: TrackerId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<()>;

    /// List the device tokens registered by a user.
    async fn list_user_tokens(&self, user_id: UserId) -> AppResult<Vec<String>>;
}
