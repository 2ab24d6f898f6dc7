//! Push gateway configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which push gateway implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushProvider {
    /// Firebase Cloud Messaging HTTP v1 API.
    Fcm,
    /// In-memory gateway that accepts every message (development only).
    Mock,
}

impl fmt::Display for PushProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fcm => write!(f, "fcm"),
            Self::Mock => write!(f, "mock"),
        }
    }
}

/// Push gateway settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Gateway implementation.
    #[serde(default = "default_provider")]
    pub provider: PushProvider,
    /// Firebase project identifier. Taken from the service account key
    /// when empty
    #[serde(default)]
    pub project_id: String,
    /// Path to a service account key file
    #[serde(default)]
    pub credentials_file: Option<String>,
    /// Inline service account key JSON, preferred over `credentials_file`
    #[serde(default)]
    pub credentials_json: Option<String>,
    /// Static OAuth2 bearer token, used only without a service account
    #[serde(default)]
    pub access_token: Option<String>,
    /// Base URL of the FCM API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Title shown on every reminder.
    #[serde(default = "default_title")]
    pub title: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl PushConfig {
    /// Per-request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            project_id: String::new(),
            credentials_file: None,
            credentials_json: None,
            access_token: None,
            endpoint: default_endpoint(),
            title: default_title(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl fmt::Debug for PushConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushConfig")
            .field("provider", &self.provider)
            .field("project_id", &self.project_id)
            .field("credentials_file", &self.credentials_file)
            .field("credentials_json", &self.credentials_json.as_ref().map(|_| "****"))
            .field("access_token", &self.access_token.as_ref().map(|_| "****"))
            .field("endpoint", &self.endpoint)
            .field("title", &self.title)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

fn default_provider() -> PushProvider {
    PushProvider::Fcm
}

fn default_endpoint() -> String {
    "https://fcm.googleapis.com".to_string()
}

fn default_title() -> String {
    "Cubby Reminder".to_string()
}

fn default_request_timeout() -> u64 {
    10
}
