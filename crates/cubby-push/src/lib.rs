//! # cubby-push
//!
//! Push delivery for Cubby reminders. Implements
//! [`PushGateway`](cubby_core::traits::PushGateway) for the Firebase Cloud
//! Messaging HTTP v1 API and for an in-memory mock used in development
//! and tests. FCM access tokens are minted from a service account key by
//! [`auth`].

pub mod auth;
pub mod fcm;
pub mod mock;

use std::sync::Arc;

use cubby_core::config::{PushConfig, PushProvider};
use cubby_core::result::AppResult;
use cubby_core::traits::PushGateway;

pub use fcm::FcmClient;
pub use mock::MockPushGateway;

/// Build the gateway selected by `config.provider`.
pub fn build_gateway(config: &PushConfig) -> AppResult<Arc<dyn PushGateway>> {
    match config.provider {
        PushProvider::Fcm => Ok(Arc::new(FcmClient::new(config)?)),
        PushProvider::Mock => Ok(Arc::new(MockPushGateway::new())),
    }
}

/// Shorten a device token for logs, keeping the first and last few
/// characters.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("short"), "****");
        assert_eq!(mask_token("abcdefghijklmnopqrstuvwxyz"), "abcdef...wxyz");
    }

    #[test]
    fn test_build_mock_gateway() {
        let config = PushConfig {
            provider: PushProvider::Mock,
            ..PushConfig::default()
        };
        let gateway = build_gateway(&config).unwrap();
        assert_eq!(gateway.name(), "mock");
    }

    #[test]
    fn test_build_fcm_requires_project() {
        let config = PushConfig::default();
        assert!(build_gateway(&config).is_err());
    }
}
