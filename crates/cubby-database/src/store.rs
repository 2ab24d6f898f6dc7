//! PostgreSQL-backed [`NotificationStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cubby_core::result::AppResult;
use cubby_core::traits::NotificationStore;
use cubby_core::types::id::{TrackerId, UserId};
use cubby_core::types::notification::{EligibleRecipient, TrackerLastEntry};

use crate::repositories::{NotificationLogRepository, PushTokenRepository, TrackerRepository};

/// Notification store that reads and writes through the repositories.
#[derive(Debug, Clone)]
pub struct PgNotificationStore {
    trackers: TrackerRepository,
    ledger: NotificationLogRepository,
    tokens: PushTokenRepository,
}

impl PgNotificationStore {
    /// Create a store over the given pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            trackers: TrackerRepository::new(pool.clone()),
            ledger: NotificationLogRepository::new(pool.clone()),
            tokens: PushTokenRepository::new(pool),
        }
    }

    /// The push token repository, for registration outside the pass.
    pub fn tokens(&self) -> &PushTokenRepository {
        &self.tokens
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn list_trackers_with_latest_entry(&self) -> AppResult<Vec<TrackerLastEntry>> {
        self.trackers.list_with_latest_entry().await
    }

    async fn list_eligible_recipients(
        &self,
        tracker_ids: &[TrackerId],
        cooldown_threshold: DateTime<Utc>,
    ) -> AppResult<Vec<EligibleRecipient>> {
        self.ledger
            .find_eligible_recipients(tracker_ids, cooldown_threshold)
            .await
    }

    async fn upsert_notification_log(
        &self,
        tracker_id: TrackerId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        self.ledger.upsert(tracker_id, user_id, now).await
    }

    async fn list_user_tokens(&self, user_id: UserId) -> AppResult<Vec<String>> {
        let tokens = self.tokens.find_by_user(user_id).await?;
        Ok(tokens.into_iter().map(|t| t.token).collect())
    }
}
