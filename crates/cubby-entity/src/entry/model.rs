//! Entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cubby_core::types::id::{EntryId, TrackerId, UserId};

/// A record that a tracker's obligation was performed.
///
/// `interval` and `interval_unit` are snapshotted from the tracker when
/// the entry is written, so a later schedule change never makes an old
/// entry overdue retroactively.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Entry {
    /// Unique entry identifier.
    pub id: EntryId,
    /// The tracker this entry belongs to.
    pub tracker_id: TrackerId,
    /// Interval count in force when the entry was recorded.
    pub interval: i32,
    /// Interval unit in force when the entry was recorded.
    pub interval_unit: String,
    /// Who performed the obligation.
    pub performed_by: UserId,
    /// When the obligation was performed.
    pub performed_at: DateTime<Utc>,
    /// Optional free-text remark.
    pub remark: String,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// When the entry was last modified.
    pub updated_at: DateTime<Utc>,
}
