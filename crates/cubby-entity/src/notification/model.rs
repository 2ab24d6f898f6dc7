//! Notification ledger model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cubby_core::types::id::{TrackerId, UserId};

/// Records when a user was last reminded about a tracker.
///
/// Unique per (tracker, user); written only after a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct NotificationLog {
    /// The tracker the reminder was about.
    pub tracker_id: TrackerId,
    /// The user who was reminded.
    pub user_id: UserId,
    /// When the user was last reminded.
    pub last_notified_at: DateTime<Utc>,
}

impl NotificationLog {
    /// Whether this row still suppresses reminders at `threshold`,
    /// i.e. it was written at or after the start of the cooldown window.
    pub fn suppresses(&self, threshold: DateTime<Utc>) -> bool {
        self.last_notified_at >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_suppresses_within_window() {
        let now = Utc::now();
        let threshold = now - Duration::hours(6);
        let mut log = NotificationLog {
            tracker_id: TrackerId::new(),
            user_id: UserId::new(),
            last_notified_at: now - Duration::hours(1),
        };
        assert!(log.suppresses(threshold));

        log.last_notified_at = now - Duration::hours(7);
        assert!(!log.suppresses(threshold));

        log.last_notified_at = threshold;
        assert!(log.suppresses(threshold));
    }
}
