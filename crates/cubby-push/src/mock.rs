//! In-memory push gateway.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use cubby_core::error::AppError;
use cubby_core::result::AppResult;
use cubby_core::traits::PushGateway;
use cubby_core::types::push::{PushMessage, PushOutcome};

use crate::mask_token;

#[derive(Debug, Default)]
struct MockState {
    sent: Vec<PushMessage>,
    batches: usize,
    rejected_tokens: HashSet<String>,
    unreachable: bool,
}

/// Push gateway that records messages instead of delivering them.
///
/// Tokens can be marked as rejected, and the whole gateway can be made
/// unreachable, to exercise partial and total delivery failures.
#[derive(Debug, Default)]
pub struct MockPushGateway {
    state: Mutex<MockState>,
}

impl MockPushGateway {
    /// Create a gateway that accepts every message.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reject every future message addressed to `token`.
    pub fn reject_token(&self, token: &str) {
        self.lock().rejected_tokens.insert(token.to_string());
    }

    /// Make every future batch fail before any message is sent.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    /// Messages accepted so far, in send order.
    pub fn sent(&self) -> Vec<PushMessage> {
        self.lock().sent.clone()
    }

    /// Number of batches that reached the gateway.
    pub fn batch_count(&self) -> usize {
        self.lock().batches
    }

    /// Forget every recorded message.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.sent.clear();
        state.batches = 0;
    }
}

#[async_trait]
impl PushGateway for MockPushGateway {
    async fn send_batch(&self, messages: &[PushMessage]) -> AppResult<Vec<PushOutcome>> {
        let mut state = self.lock();
        if state.unreachable {
            return Err(AppError::external_service("mock push gateway is unreachable"));
        }
        state.batches += 1;

        let mut outcomes = Vec::with_capacity(messages.len());
        for (index, message) in messages.iter().enumerate() {
            if state.rejected_tokens.contains(&message.device_token) {
                debug!(token = %mask_token(&message.device_token), "Mock gateway rejected message");
                outcomes.push(PushOutcome::rejected(
                    message.device_token.clone(),
                    "UNREGISTERED",
                ));
                continue;
            }

            let id = format!("mock-{}-{index}", state.batches);
            state.sent.push(message.clone());
            outcomes.push(PushOutcome::accepted(message.device_token.clone(), Some(id)));
        }
        Ok(outcomes)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_accepted_messages() {
        let gateway = MockPushGateway::new();
        gateway.reject_token("bad");
        let messages = vec![
            PushMessage::new("good", "Cubby Reminder", "Trackers due: Filter"),
            PushMessage::new("bad", "Cubby Reminder", "Trackers due: Filter"),
        ];

        let outcomes = gateway.send_batch(&messages).await.unwrap();
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert_eq!(gateway.sent().len(), 1);
        assert_eq!(gateway.batch_count(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_sends_nothing() {
        let gateway = MockPushGateway::new();
        gateway.set_unreachable(true);
        let messages = vec![PushMessage::new("tok", "t", "b")];

        assert!(gateway.send_batch(&messages).await.is_err());
        assert!(gateway.sent().is_empty());
        assert_eq!(gateway.batch_count(), 0);
    }
}
