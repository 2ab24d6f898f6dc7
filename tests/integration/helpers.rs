//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use cubby_core::config::{NotifierConfig, PushConfig};
use cubby_core::types::id::{FamilyId, TrackerId, UserId};
use cubby_database::MemoryNotificationStore;
use cubby_entity::push_token::Platform;
use cubby_push::MockPushGateway;
use cubby_worker::NotificationPass;

/// Test application context backed by the in-memory store and mock gateway.
pub struct TestApp {
    /// Store holding every row the pass reads and writes.
    pub store: Arc<MemoryNotificationStore>,
    /// Gateway recording every message sent.
    pub gateway: Arc<MockPushGateway>,
    /// Scheduler settings used to build the pass.
    pub notifier: NotifierConfig,
    /// Push settings used to build the pass.
    pub push: PushConfig,
}

/// A family with one owner holding one device.
pub struct Household {
    pub family: FamilyId,
    pub owner: UserId,
    pub token: String,
}

impl TestApp {
    /// Create a new test application with default settings.
    pub fn new() -> Self {
        Self::with_notifier(NotifierConfig::default())
    }

    /// Create a new test application with custom scheduler settings.
    pub fn with_notifier(notifier: NotifierConfig) -> Self {
        Self {
            store: Arc::new(MemoryNotificationStore::new()),
            gateway: Arc::new(MockPushGateway::new()),
            notifier,
            push: PushConfig::default(),
        }
    }

    /// Build a pass over this app's store and gateway.
    pub fn pass(&self) -> NotificationPass {
        NotificationPass::new(
            self.store.clone(),
            self.gateway.clone(),
            &self.notifier,
            &self.push,
        )
    }

    /// Create a family whose owner registered `token` on Android.
    pub fn household(&self, token: &str) -> Household {
        let owner = UserId::new();
        let family = self.store.add_family(owner);
        self.store.register_token(owner, token, Platform::Android);
        Household {
            family,
            owner,
            token: token.to_string(),
        }
    }

    /// Create a tracker whose latest entry was performed `days_ago` days
    /// before `now` with the same interval as the tracker.
    pub fn tracker_done_days_ago(
        &self,
        family: FamilyId,
        name: &str,
        interval_days: i32,
        days_ago: i64,
        now: DateTime<Utc>,
    ) -> TrackerId {
        let tracker = self.store.add_tracker(family, name, interval_days, "day");
        self.store
            .add_entry(tracker, now - Duration::days(days_ago), interval_days, "day");
        tracker
    }

    /// Bodies of every message sent to `token`.
    pub fn bodies_for(&self, token: &str) -> Vec<String> {
        self.gateway
            .sent()
            .into_iter()
            .filter(|m| m.device_token == token)
            .map(|m| m.body)
            .collect()
    }
}
