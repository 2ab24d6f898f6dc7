//! Push token entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cubby_core::types::id::{PushTokenId, UserId};

/// A device registered to receive push notifications.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PushToken {
    /// Unique registration identifier.
    pub id: PushTokenId,
    /// The user who registered the device.
    pub user_id: UserId,
    /// Opaque gateway token.
    pub token: String,
    /// Platform tag (`web`, `ios`, `android`).
    pub platform: Option<String>,
    /// When the token was first registered.
    pub created_at: DateTime<Utc>,
    /// When the token was last refreshed.
    pub updated_at: DateTime<Utc>,
}
