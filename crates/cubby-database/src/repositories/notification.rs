//! Notification ledger repository implementation.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cubby_core::error::{AppError, ErrorKind};
use cubby_core::result::AppResult;
use cubby_core::types::id::{TrackerId, UserId};
use cubby_core::types::notification::EligibleRecipient;

/// Repository for the notification ledger and recipient lookups.
#[derive(Debug, Clone)]
pub struct NotificationLogRepository {
    pool: PgPool,
}

impl NotificationLogRepository {
    /// Create a new notification ledger repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List (token, user, tracker) triples for the given trackers whose
    /// user was not reminded at or after `cooldown_threshold`.
    ///
    /// Members are the family owner plus every `families_users` row. Users
    /// without a registered token produce no rows.
    pub async fn find_eligible_recipients(
        &self,
        tracker_ids: &[TrackerId],
        cooldown_threshold: DateTime<Utc>,
    ) -> AppResult<Vec<EligibleRecipient>> {
        if tracker_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, EligibleRecipient>(
            "SELECT pt.token AS device_token, \
                    members.user_id, \
                    t.id AS tracker_id, \
                    t.display AS tracker_display_name \
             FROM trackers t \
             JOIN ( \
                 SELECT id AS family_id, owner_id AS user_id FROM families \
                 UNION \
                 SELECT family_id, user_id FROM families_users \
             ) AS members ON members.family_id = t.family_id \
             JOIN push_tokens pt ON pt.user_id = members.user_id \
             LEFT JOIN notification_logs nl \
                 ON nl.tracker_id = t.id AND nl.user_id = members.user_id \
             WHERE t.id = ANY($1) \
               AND (nl.tracker_id IS NULL OR nl.last_notified_at < $2) \
             ORDER BY t.id, members.user_id, pt.created_at",
        )
        .bind(tracker_ids)
        .bind(cooldown_threshold)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list eligible recipients", e)
        })
    }

    /// Record that a user was reminded about a tracker at `now`.
    pub async fn upsert(
        &self,
        tracker_id: TrackerId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO notification_logs (tracker_id, user_id, last_notified_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (tracker_id, user_id) \
             DO UPDATE SET last_notified_at = EXCLUDED.last_notified_at",
        )
        .bind(tracker_id)
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Failed to record notification for tracker {tracker_id}"),
                e,
            )
        })?;
        Ok(())
    }
}
