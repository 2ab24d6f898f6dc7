//! Recipient resolution with the cooldown window applied.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use cubby_core::result::AppResult;
use cubby_core::traits::NotificationStore;
use cubby_core::types::id::TrackerId;
use cubby_core::types::notification::EligibleRecipient;

/// Expands due trackers into (token, user, tracker) triples.
pub struct RecipientResolver {
    store: Arc<dyn NotificationStore>,
    cooldown: Duration,
}

impl RecipientResolver {
    /// Create a resolver that suppresses pairs notified within `cooldown`.
    pub fn new(store: Arc<dyn NotificationStore>, cooldown: Duration) -> Self {
        Self { store, cooldown }
    }

    /// The cooldown window.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Return the eligible triples for `due`, in store order with exact
    /// duplicates removed.
    pub async fn resolve(
        &self,
        due: &BTreeSet<TrackerId>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<EligibleRecipient>> {
        if due.is_empty() {
            return Ok(Vec::new());
        }

        let threshold = now - self.cooldown;
        let tracker_ids: Vec<TrackerId> = due.iter().copied().collect();
        let rows = self
            .store
            .list_eligible_recipients(&tracker_ids, threshold)
            .await?;

        let mut seen = HashSet::with_capacity(rows.len());
        let recipients: Vec<EligibleRecipient> =
            rows.into_iter().filter(|r| seen.insert(r.clone())).collect();

        debug!(
            trackers = tracker_ids.len(),
            recipients = recipients.len(),
            %threshold,
            "Resolved recipients"
        );
        Ok(recipients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubby_core::types::id::UserId;
    use cubby_database::MemoryNotificationStore;
    use cubby_entity::push_token::Platform;

    #[tokio::test]
    async fn test_cooldown_window() {
        let store = Arc::new(MemoryNotificationStore::new());
        let user = UserId::new();
        let family = store.add_family(user);
        let tracker = store.add_tracker(family, "Filter", 3, "month");
        store.register_token(user, "tok", Platform::Android);
        let now = Utc::now();

        let resolver = RecipientResolver::new(store.clone(), Duration::hours(6));
        let due = BTreeSet::from([tracker]);

        store.set_notified(tracker, user, now - Duration::hours(1));
        assert!(resolver.resolve(&due, now).await.unwrap().is_empty());

        store.set_notified(tracker, user, now - Duration::hours(7));
        let recipients = resolver.resolve(&due, now).await.unwrap();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].device_token, "tok");
        assert_eq!(recipients[0].tracker_display_name, "Filter");
    }

    #[tokio::test]
    async fn test_cooldown_is_per_user_not_per_device() {
        let store = Arc::new(MemoryNotificationStore::new());
        let user = UserId::new();
        let family = store.add_family(user);
        let tracker = store.add_tracker(family, "Filter", 3, "month");
        store.register_token(user, "phone", Platform::Ios);
        store.register_token(user, "browser", Platform::Web);
        let now = Utc::now();
        store.set_notified(tracker, user, now - Duration::minutes(5));

        let resolver = RecipientResolver::new(store, Duration::hours(6));
        let recipients = resolver.resolve(&BTreeSet::from([tracker]), now).await.unwrap();
        assert!(recipients.is_empty());
    }

    #[tokio::test]
    async fn test_user_without_tokens_contributes_nothing() {
        let store = Arc::new(MemoryNotificationStore::new());
        let owner = UserId::new();
        let family = store.add_family(owner);
        store.add_member(family, UserId::new());
        let tracker = store.add_tracker(family, "Filter", 3, "month");
        store.register_token(owner, "owner-tok", Platform::Web);

        let resolver = RecipientResolver::new(store, Duration::hours(6));
        let recipients = resolver
            .resolve(&BTreeSet::from([tracker]), Utc::now())
            .await
            .unwrap();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].user_id, owner);
    }

    #[tokio::test]
    async fn test_empty_due_set_skips_store() {
        let store = Arc::new(MemoryNotificationStore::new());
        store.fail_reads(true);
        let resolver = RecipientResolver::new(store, Duration::hours(6));
        assert!(resolver.resolve(&BTreeSet::new(), Utc::now()).await.unwrap().is_empty());
    }
}
