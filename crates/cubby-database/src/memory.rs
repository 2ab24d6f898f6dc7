//! In-memory [`NotificationStore`] used by the `mock` provider setup and
//! by tests.
//!
//! Mirrors the PostgreSQL store: latest entry per tracker, family
//! membership as owner plus members, one token per user and platform, and
//! a ledger keyed by (tracker, user).

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use cubby_core::error::AppError;
use cubby_core::result::AppResult;
use cubby_core::traits::NotificationStore;
use cubby_core::types::id::{EntryId, FamilyId, PushTokenId, TrackerId, UserId};
use cubby_core::types::notification::{EligibleRecipient, TrackerLastEntry};
use cubby_entity::entry::Entry;
use cubby_entity::notification::NotificationLog;
use cubby_entity::push_token::{Platform, PushToken};
use cubby_entity::tracker::Tracker;

#[derive(Debug, Default)]
struct MemoryState {
    /// family -> owner
    families: HashMap<FamilyId, UserId>,
    /// family -> members in join order
    members: HashMap<FamilyId, Vec<UserId>>,
    trackers: Vec<Tracker>,
    entries: Vec<Entry>,
    tokens: Vec<PushToken>,
    logs: HashMap<(TrackerId, UserId), NotificationLog>,
    fail_reads: bool,
    failing_log_writes: HashSet<(TrackerId, UserId)>,
}

/// Notification store holding all rows in process memory.
#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    state: Mutex<MemoryState>,
}

impl MemoryNotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create a family owned by `owner`.
    pub fn add_family(&self, owner: UserId) -> FamilyId {
        let id = FamilyId::new();
        let mut state = self.lock();
        state.families.insert(id, owner);
        state.members.insert(id, Vec::new());
        id
    }

    /// Add a member to a family. Adding the same user twice is a no-op.
    pub fn add_member(&self, family_id: FamilyId, user_id: UserId) {
        let mut state = self.lock();
        let members = state.members.entry(family_id).or_default();
        if !members.contains(&user_id) {
            members.push(user_id);
        }
    }

    /// Create a tracker in a family. The family owner becomes its owner.
    pub fn add_tracker(
        &self,
        family_id: FamilyId,
        display: &str,
        interval: i32,
        interval_unit: &str,
    ) -> TrackerId {
        let now = Utc::now();
        let mut state = self.lock();
        let owner_id = state.families.get(&family_id).copied().unwrap_or_default();
        let tracker = Tracker {
            id: TrackerId::new(),
            owner_id,
            family_id,
            name: display.to_lowercase().replace(' ', "_"),
            display: display.to_string(),
            interval,
            interval_unit: interval_unit.to_string(),
            show: true,
            created_at: now,
            updated_at: now,
        };
        let id = tracker.id;
        state.trackers.push(tracker);
        id
    }

    /// Record a performance of a tracker with the interval captured at the
    /// time. The unit is stored verbatim, malformed values included.
    pub fn add_entry(
        &self,
        tracker_id: TrackerId,
        performed_at: DateTime<Utc>,
        interval: i32,
        interval_unit: &str,
    ) -> EntryId {
        let now = Utc::now();
        let mut state = self.lock();
        let performed_by = state
            .trackers
            .iter()
            .find(|t| t.id == tracker_id)
            .map(|t| t.owner_id)
            .unwrap_or_default();
        let entry = Entry {
            id: EntryId::new(),
            tracker_id,
            interval,
            interval_unit: interval_unit.to_string(),
            performed_by,
            performed_at,
            remark: String::new(),
            created_at: now,
            updated_at: now,
        };
        let id = entry.id;
        state.entries.push(entry);
        id
    }

    /// Register a device token, replacing the user's other tokens on the
    /// same platform.
    pub fn register_token(&self, user_id: UserId, token: &str, platform: Platform) {
        let now = Utc::now();
        let mut state = self.lock();
        state.tokens.retain(|t| {
            t.user_id != user_id
                || t.token == token
                || t.platform.as_deref() != Some(platform.as_str())
        });

        if let Some(existing) = state
            .tokens
            .iter_mut()
            .find(|t| t.user_id == user_id && t.token == token)
        {
            existing.platform = Some(platform.as_str().to_string());
            existing.updated_at = now;
            return;
        }

        state.tokens.push(PushToken {
            id: PushTokenId::new(),
            user_id,
            token: token.to_string(),
            platform: Some(platform.as_str().to_string()),
            created_at: now,
            updated_at: now,
        });
    }

    /// Seed a ledger row.
    pub fn set_notified(&self, tracker_id: TrackerId, user_id: UserId, at: DateTime<Utc>) {
        self.lock().logs.insert(
            (tracker_id, user_id),
            NotificationLog {
                tracker_id,
                user_id,
                last_notified_at: at,
            },
        );
    }

    /// Read a ledger row.
    pub fn notification_log(&self, tracker_id: TrackerId, user_id: UserId) -> Option<NotificationLog> {
        self.lock().logs.get(&(tracker_id, user_id)).cloned()
    }

    /// Number of ledger rows.
    pub fn log_count(&self) -> usize {
        self.lock().logs.len()
    }

    /// Make every read fail with a database error.
    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Make ledger writes for one (tracker, user) pair fail.
    pub fn fail_log_write(&self, tracker_id: TrackerId, user_id: UserId) {
        self.lock().failing_log_writes.insert((tracker_id, user_id));
    }

    fn family_members(state: &MemoryState, family_id: FamilyId) -> Vec<UserId> {
        let mut users = Vec::new();
        if let Some(owner) = state.families.get(&family_id) {
            users.push(*owner);
        }
        for member in state.members.get(&family_id).into_iter().flatten() {
            if !users.contains(member) {
                users.push(*member);
            }
        }
        users
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn list_trackers_with_latest_entry(&self) -> AppResult<Vec<TrackerLastEntry>> {
        let state = self.lock();
        if state.fail_reads {
            return Err(AppError::database("memory store reads disabled"));
        }

        let rows = state
            .trackers
            .iter()
            .filter_map(|tracker| {
                // Later insertions win ties on performed_at.
                let latest = state
                    .entries
                    .iter()
                    .filter(|e| e.tracker_id == tracker.id)
                    .fold(None::<&Entry>, |best, e| match best {
                        Some(b) if b.performed_at > e.performed_at => Some(b),
                        _ => Some(e),
                    })?;

                Some(TrackerLastEntry {
                    tracker_id: tracker.id,
                    family_id: tracker.family_id,
                    name: tracker.display.clone(),
                    last_performed_at: latest.performed_at,
                    applied_interval: latest.interval,
                    applied_unit: latest.interval_unit.clone(),
                })
            })
            .collect();
        Ok(rows)
    }

    async fn list_eligible_recipients(
        &self,
        tracker_ids: &[TrackerId],
        cooldown_threshold: DateTime<Utc>,
    ) -> AppResult<Vec<EligibleRecipient>> {
        let state = self.lock();
        if state.fail_reads {
            return Err(AppError::database("memory store reads disabled"));
        }

        let mut rows = Vec::new();
        for tracker in state.trackers.iter().filter(|t| tracker_ids.contains(&t.id)) {
            for user_id in Self::family_members(&state, tracker.family_id) {
                let suppressed = state
                    .logs
                    .get(&(tracker.id, user_id))
                    .is_some_and(|log| log.suppresses(cooldown_threshold));
                if suppressed {
                    continue;
                }

                for token in state.tokens.iter().filter(|t| t.user_id == user_id) {
                    rows.push(EligibleRecipient {
                        device_token: token.token.clone(),
                        user_id,
                        tracker_id: tracker.id,
                        tracker_display_name: tracker.display.clone(),
                    });
                }
            }
        }

        debug!(count = rows.len(), "Resolved eligible recipients from memory");
        Ok(rows)
    }

    async fn upsert_notification_log(
        &self,
        tracker_id: TrackerId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.lock();
        if state.failing_log_writes.contains(&(tracker_id, user_id)) {
            return Err(AppError::database(format!(
                "ledger write rejected for tracker {tracker_id}"
            )));
        }

        state.logs.insert(
            (tracker_id, user_id),
            NotificationLog {
                tracker_id,
                user_id,
                last_notified_at: now,
            },
        );
        Ok(())
    }

    async fn list_user_tokens(&self, user_id: UserId) -> AppResult<Vec<String>> {
        let state = self.lock();
        if state.fail_reads {
            return Err(AppError::database("memory store reads disabled"));
        }
        Ok(state
            .tokens
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.token.clone())
            .collect())
    }
}
