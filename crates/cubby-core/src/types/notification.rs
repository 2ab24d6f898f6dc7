//! Rows exchanged between the reminder worker and its storage collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{FamilyId, TrackerId, UserId};

/// A tracker joined with its most recent entry.
///
/// `applied_interval` and `applied_unit` are the values captured on the
/// entry when it was recorded, not the tracker's current schedule. The
/// unit is kept as raw text so a malformed row can be skipped by the
/// evaluator instead of failing the whole read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TrackerLastEntry {
    /// The tracker.
    pub tracker_id: TrackerId,
    /// The family that owns the tracker.
    pub family_id: FamilyId,
    /// Display name of the tracker.
    pub name: String,
    /// When the latest entry was performed.
    pub last_performed_at: DateTime<Utc>,
    /// Interval count captured on the latest entry.
    pub applied_interval: i32,
    /// Interval unit captured on the latest entry.
    pub applied_unit: String,
}

/// A (device token, user, tracker) triple eligible for a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct EligibleRecipient {
    /// Opaque device token.
    pub device_token: String,
    /// The user who registered the token.
    pub user_id: UserId,
    /// The due tracker.
    pub tracker_id: TrackerId,
    /// Display name of the due tracker.
    pub tracker_display_name: String,
}
