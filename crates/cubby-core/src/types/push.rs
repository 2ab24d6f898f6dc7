//! Messages and outcomes exchanged with the push gateway.

use serde::{Deserialize, Serialize};

/// A single push message addressed to one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Opaque device token.
    pub device_token: String,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
}

impl PushMessage {
    /// Create a new message.
    pub fn new(
        device_token: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            device_token: device_token.into(),
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Per-message result reported by the push gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushOutcome {
    /// Token the message was addressed to.
    pub device_token: String,
    /// Whether the gateway accepted the message.
    pub success: bool,
    /// Gateway-provided message id on success.
    pub message_id: Option<String>,
    /// Rejection reason on failure.
    pub error: Option<String>,
}

impl PushOutcome {
    /// An accepted message.
    pub fn accepted(device_token: impl Into<String>, message_id: Option<String>) -> Self {
        Self {
            device_token: device_token.into(),
            success: true,
            message_id,
            error: None,
        }
    }

    /// A rejected message.
    pub fn rejected(device_token: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            device_token: device_token.into(),
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}
