//! Tracker entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cubby_core::types::id::{FamilyId, TrackerId, UserId};

/// A recurring household obligation, e.g. "change bedsheet every 14 days".
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tracker {
    /// Unique tracker identifier.
    pub id: TrackerId,
    /// The user who created the tracker.
    pub owner_id: UserId,
    /// The family that owns the tracker.
    pub family_id: FamilyId,
    /// Machine name.
    pub name: String,
    /// Name shown to users and in reminders.
    pub display: String,
    /// Recurrence interval count.
    pub interval: i32,
    /// Recurrence interval unit (`day`, `month`, `year`).
    pub interval_unit: String,
    /// Whether the tracker is shown in the app.
    pub show: bool,
    /// When the tracker was created.
    pub created_at: DateTime<Utc>,
    /// When the tracker was last modified.
    pub updated_at: DateTime<Utc>,
}
