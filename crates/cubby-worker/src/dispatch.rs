//! Sending batches and recording the notification ledger.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use cubby_core::traits::{NotificationStore, PushGateway};
use cubby_core::types::push::PushMessage;

use crate::batch::NotificationBatch;
use crate::error::NotifyError;

/// Counts for one dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Messages handed to the gateway
    pub messages: usize,
    /// Messages the gateway accepted
    pub delivered: usize,
    /// Ledger rows written
    pub ledger_writes: usize,
}

/// Sends composed batches through the push gateway
pub struct Dispatcher {
    gateway: Arc<dyn PushGateway>,
    store: Arc<dyn NotificationStore>,
}

impl Dispatcher {
    /// Create a dispatcher
    pub fn new(gateway: Arc<dyn PushGateway>, store: Arc<dyn NotificationStore>) -> Self {
        Self { gateway, store }
    }

    /// Send every batch in one gateway call, then write a ledger row with
    /// `last_notified_at = now` for each pair behind an accepted message.
    ///
    /// A gateway failure writes nothing. Rejected messages and failed
    /// ledger writes are counted and reported as
    /// [`NotifyError::PartialDelivery`]; rows already written stay.
    pub async fn dispatch(
        &self,
        batches: &[NotificationBatch],
        now: DateTime<Utc>,
    ) -> Result<DispatchSummary, NotifyError> {
        if batches.is_empty() {
            return Ok(DispatchSummary::default());
        }

        let messages: Vec<PushMessage> = batches.iter().map(NotificationBatch::to_message).collect();
        let outcomes = self
            .gateway
            .send_batch(&messages)
            .await
            .map_err(NotifyError::Gateway)?;

        if outcomes.len() != batches.len() {
            warn!(
                gateway = self.gateway.name(),
                expected = batches.len(),
                received = outcomes.len(),
                "Gateway returned a mismatched outcome count"
            );
        }

        let mut summary = DispatchSummary {
            messages: messages.len(),
            ..DispatchSummary::default()
        };
        let mut failed_ledger_writes = 0;

        for (index, batch) in batches.iter().enumerate() {
            // A missing outcome counts as a rejection.
            let Some(outcome) = outcomes.get(index).filter(|o| o.success) else {
                continue;
            };
            summary.delivered += 1;

            for (tracker_id, user_id) in &batch.pairs {
                match self
                    .store
                    .upsert_notification_log(*tracker_id, *user_id, now)
                    .await
                {
                    Ok(()) => summary.ledger_writes += 1,
                    Err(e) => {
                        failed_ledger_writes += 1;
                        error!(
                            %tracker_id,
                            %user_id,
                            message_id = outcome.message_id.as_deref().unwrap_or_default(),
                            error = %e,
                            "Failed to record notification"
                        );
                    }
                }
            }
        }

        let failed_messages = summary.messages - summary.delivered;
        info!(
            gateway = self.gateway.name(),
            messages = summary.messages,
            delivered = summary.delivered,
            failed = failed_messages,
            ledger_writes = summary.ledger_writes,
            "Dispatched reminders"
        );

        if failed_messages > 0 || failed_ledger_writes > 0 {
            return Err(NotifyError::PartialDelivery {
                failed_messages,
                failed_ledger_writes,
                total_messages: summary.messages,
            });
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubby_core::types::id::{TrackerId, UserId};
    use cubby_core::types::notification::EligibleRecipient;
    use cubby_database::MemoryNotificationStore;
    use cubby_push::MockPushGateway;

    use crate::batch::compose;

    fn recipient(token: &str, user: UserId, tracker: TrackerId) -> EligibleRecipient {
        EligibleRecipient {
            device_token: token.to_string(),
            user_id: user,
            tracker_id: tracker,
            tracker_display_name: "Filter".to_string(),
        }
    }

    fn setup() -> (Arc<MemoryNotificationStore>, Arc<MockPushGateway>, Dispatcher) {
        let store = Arc::new(MemoryNotificationStore::new());
        let gateway = Arc::new(MockPushGateway::new());
        let dispatcher = Dispatcher::new(gateway.clone(), store.clone());
        (store, gateway, dispatcher)
    }

    #[tokio::test]
    async fn test_no_batches_is_noop() {
        let (store, gateway, dispatcher) = setup();
        let summary = dispatcher.dispatch(&[], Utc::now()).await.unwrap();
        assert_eq!(summary, DispatchSummary::default());
        assert_eq!(gateway.batch_count(), 0);
        assert_eq!(store.log_count(), 0);
    }

    #[tokio::test]
    async fn test_partial_failure_writes_only_successes() {
        let (store, gateway, dispatcher) = setup();
        gateway.reject_token("D2");
        let (u1, u2) = (UserId::new(), UserId::new());
        let (t1, t2) = (TrackerId::new(), TrackerId::new());
        let batches = compose(
            &[
                recipient("D1", u1, t1),
                recipient("D1", u1, t2),
                recipient("D2", u2, t1),
            ],
            "Cubby Reminder",
        );
        let now = Utc::now();

        let err = dispatcher.dispatch(&batches, now).await.unwrap_err();
        assert!(matches!(
            err,
            NotifyError::PartialDelivery {
                failed_messages: 1,
                failed_ledger_writes: 0,
                total_messages: 2,
            }
        ));

        assert_eq!(store.notification_log(t1, u1).unwrap().last_notified_at, now);
        assert_eq!(store.notification_log(t2, u1).unwrap().last_notified_at, now);
        assert!(store.notification_log(t1, u2).is_none());
    }

    #[tokio::test]
    async fn test_gateway_failure_writes_nothing() {
        let (store, gateway, dispatcher) = setup();
        gateway.set_unreachable(true);
        let batches = compose(
            &[recipient("D1", UserId::new(), TrackerId::new())],
            "Cubby Reminder",
        );

        let err = dispatcher.dispatch(&batches, Utc::now()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Gateway(_)));
        assert_eq!(store.log_count(), 0);
    }

    #[tokio::test]
    async fn test_ledger_write_failure_keeps_other_rows() {
        let (store, _gateway, dispatcher) = setup();
        let (u1, u2) = (UserId::new(), UserId::new());
        let tracker = TrackerId::new();
        store.fail_log_write(tracker, u1);
        let batches = compose(
            &[recipient("D1", u1, tracker), recipient("D2", u2, tracker)],
            "Cubby Reminder",
        );

        let err = dispatcher.dispatch(&batches, Utc::now()).await.unwrap_err();
        assert!(matches!(
            err,
            NotifyError::PartialDelivery {
                failed_messages: 0,
                failed_ledger_writes: 1,
                ..
            }
        ));
        assert!(store.notification_log(tracker, u1).is_none());
        assert!(store.notification_log(tracker, u2).is_some());
    }
}
