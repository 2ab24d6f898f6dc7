//! One end-to-end reminder pass.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use cubby_core::config::{NotifierConfig, PushConfig};
use cubby_core::error::AppError;
use cubby_core::result::AppResult;
use cubby_core::traits::{NotificationStore, PushGateway};
use cubby_core::types::id::UserId;
use cubby_core::types::push::{PushMessage, PushOutcome};

use crate::batch::compose;
use crate::dispatch::{DispatchSummary, Dispatcher};
use crate::error::NotifyError;
use crate::recipients::RecipientResolver;
use crate::resolver::DueSetResolver;

const TEST_BODY: &str = "Push notifications are working.";

/// Counts for a finished pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Trackers found due
    pub due_trackers: usize,
    /// Eligible (token, user, tracker) triples
    pub recipients: usize,
    /// Messages composed
    pub batches: usize,
    /// Dispatch counts
    pub dispatch: DispatchSummary,
}

/// Runs due resolution, recipient resolution, composition and dispatch in
/// sequence under a deadline.
pub struct NotificationPass {
    due_set: DueSetResolver,
    recipients: RecipientResolver,
    dispatcher: Dispatcher,
    store: Arc<dyn NotificationStore>,
    gateway: Arc<dyn PushGateway>,
    title: String,
    timeout: Duration,
}

impl NotificationPass {
    /// Build a pass over the given collaborators
    pub fn new(
        store: Arc<dyn NotificationStore>,
        gateway: Arc<dyn PushGateway>,
        notifier: &NotifierConfig,
        push: &PushConfig,
    ) -> Self {
        Self {
            due_set: DueSetResolver::new(store.clone()),
            recipients: RecipientResolver::new(store.clone(), notifier.cooldown()),
            dispatcher: Dispatcher::new(gateway.clone(), store.clone()),
            store,
            gateway,
            title: push.title.clone(),
            timeout: notifier.pass_timeout(),
        }
    }

    /// Run one pass at the current time
    pub async fn run_one_pass(&self) -> Result<PassReport, NotifyError> {
        self.run_pass_at(Utc::now()).await
    }

    /// Run one pass as of `now`, aborting with [`NotifyError::Timeout`] once
    /// the deadline passes. Ledger rows written before the deadline stay.
    pub async fn run_pass_at(&self, now: DateTime<Utc>) -> Result<PassReport, NotifyError> {
        let started = Instant::now();
        info!(%now, "Starting notification pass");

        let result = match tokio::time::timeout(self.timeout, self.execute(now)).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(self.timeout)),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(report) => info!(
                due = report.due_trackers,
                recipients = report.recipients,
                batches = report.batches,
                delivered = report.dispatch.delivered,
                elapsed_ms,
                "Notification pass finished"
            ),
            Err(e) => warn!(error = %e, elapsed_ms, "Notification pass failed"),
        }
        result
    }

    async fn execute(&self, now: DateTime<Utc>) -> Result<PassReport, NotifyError> {
        let due = self
            .due_set
            .resolve_due(now)
            .await
            .map_err(NotifyError::DueSet)?;
        if due.is_empty() {
            return Ok(PassReport::default());
        }

        let recipients = self
            .recipients
            .resolve(&due, now)
            .await
            .map_err(NotifyError::Recipients)?;
        let batches = compose(&recipients, &self.title);
        let dispatch = self.dispatcher.dispatch(&batches, now).await?;

        Ok(PassReport {
            due_trackers: due.len(),
            recipients: recipients.len(),
            batches: batches.len(),
            dispatch,
        })
    }

    /// Send a fixed test message to every device registered by `user_id`.
    ///
    /// The ledger is not touched. Fails with `NotFound` when the user has
    /// no registered device.
    pub async fn send_test_notification(&self, user_id: UserId) -> AppResult<Vec<PushOutcome>> {
        let tokens = self.store.list_user_tokens(user_id).await?;
        if tokens.is_empty() {
            return Err(AppError::not_found(format!(
                "No push tokens registered for user {user_id}"
            )));
        }

        let messages: Vec<PushMessage> = tokens
            .into_iter()
            .map(|token| PushMessage::new(token, self.title.clone(), TEST_BODY))
            .collect();
        let outcomes = self.gateway.send_batch(&messages).await?;

        info!(
            %user_id,
            devices = messages.len(),
            accepted = outcomes.iter().filter(|o| o.success).count(),
            "Sent test notification"
        );
        Ok(outcomes)
    }
}
