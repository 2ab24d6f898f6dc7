//! Due-set resolution.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use cubby_core::result::AppResult;
use cubby_core::traits::NotificationStore;
use cubby_core::types::id::TrackerId;
use cubby_core::types::notification::TrackerLastEntry;
use cubby_entity::tracker::IntervalUnit;

use crate::due::{self, DueStatus};

/// Reduces trackers and their latest entries to the set currently due.
pub struct DueSetResolver {
    store: Arc<dyn NotificationStore>,
}

impl DueSetResolver {
    /// Create a resolver over the given store.
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Read every tracker with its latest entry and return those due at
    /// `now`.
    pub async fn resolve_due(&self, now: DateTime<Utc>) -> AppResult<BTreeSet<TrackerId>> {
        let rows = self.store.list_trackers_with_latest_entry().await?;
        let due = due_trackers(&rows, now);
        debug!(trackers = rows.len(), due = due.len(), "Evaluated trackers");
        Ok(due)
    }
}

/// Evaluate each row against the interval captured on its latest entry.
///
/// Rows with an unknown unit or an invalid interval are logged and
/// skipped.
pub fn due_trackers(rows: &[TrackerLastEntry], now: DateTime<Utc>) -> BTreeSet<TrackerId> {
    rows.iter()
        .filter(|row| {
            let status = row
                .applied_unit
                .parse::<IntervalUnit>()
                .and_then(|unit| {
                    due::evaluate(row.last_performed_at, row.applied_interval, unit, now)
                });

            match status {
                Ok(status) => status == DueStatus::Due,
                Err(e) => {
                    warn!(
                        tracker_id = %row.tracker_id,
                        interval = row.applied_interval,
                        unit = %row.applied_unit,
                        error = %e,
                        "Skipping tracker with malformed interval"
                    );
                    false
                }
            }
        })
        .map(|row| row.tracker_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use cubby_core::types::id::{FamilyId, UserId};
    use cubby_database::MemoryNotificationStore;

    fn row(
        name: &str,
        days_ago: i64,
        interval: i32,
        unit: &str,
        now: DateTime<Utc>,
    ) -> TrackerLastEntry {
        TrackerLastEntry {
            tracker_id: TrackerId::new(),
            family_id: FamilyId::new(),
            name: name.to_string(),
            last_performed_at: now - Duration::days(days_ago),
            applied_interval: interval,
            applied_unit: unit.to_string(),
        }
    }

    #[test]
    fn test_due_trackers_filters_and_skips_malformed() {
        let now = Utc::now();
        let overdue = row("Bedsheet Change", 15, 14, "day", now);
        let fresh = row("Filter", 10, 3, "month", now);
        let bad_unit = row("Gutter", 400, 1, "fortnight", now);
        let bad_interval = row("Smoke Alarm", 400, 0, "year", now);
        let rows = vec![overdue.clone(), fresh, bad_unit, bad_interval];

        let due = due_trackers(&rows, now);
        assert_eq!(due.len(), 1);
        assert!(due.contains(&overdue.tracker_id));
    }

    #[test]
    fn test_due_trackers_is_stable() {
        let now = Utc::now();
        let rows: Vec<_> = (0..5).map(|i| row("T", 30 + i, 1, "day", now)).collect();
        let mut reversed = rows.clone();
        reversed.reverse();
        assert_eq!(due_trackers(&rows, now), due_trackers(&reversed, now));
    }

    #[tokio::test]
    async fn test_resolve_uses_interval_captured_on_entry() {
        let store = Arc::new(MemoryNotificationStore::new());
        let family = store.add_family(UserId::new());
        // Tracker now says 30 days, but the latest entry captured 7.
        let tracker = store.add_tracker(family, "Towels", 30, "day");
        let now = Utc::now();
        store.add_entry(tracker, now - Duration::days(10), 7, "day");
        let untouched = store.add_tracker(family, "Never Done", 1, "day");

        let resolver = DueSetResolver::new(store);
        let due = resolver.resolve_due(now).await.unwrap();
        assert!(due.contains(&tracker));
        assert!(!due.contains(&untouched));
    }
}
