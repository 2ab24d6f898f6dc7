//! Periodic scheduler driving notification passes.

use std::sync::Arc;

use tokio::sync::{Semaphore, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use cubby_core::config::NotifierConfig;
use cubby_core::result::AppResult;

use crate::pass::NotificationPass;

/// Fires a pass on every tick until cancelled.
///
/// Each tick runs its pass on a tracked task. A semaphore sized by
/// `max_concurrent_passes` bounds how many passes overlap; a tick that
/// finds every slot taken is skipped.
pub struct NotificationScheduler {
    pass: Arc<NotificationPass>,
    config: NotifierConfig,
}

impl NotificationScheduler {
    /// Create a scheduler
    pub fn new(pass: Arc<NotificationPass>, config: NotifierConfig) -> Self {
        Self { pass, config }
    }

    /// Spawn the tick loop. The first tick fires one interval from now.
    ///
    /// Fails without spawning anything when the notifier settings are out
    /// of range.
    pub fn start(self) -> AppResult<SchedulerHandle> {
        self.config.validate()?;
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(cancel_rx));
        Ok(SchedulerHandle {
            cancel: cancel_tx,
            task,
        })
    }

    async fn run(self, mut cancel: watch::Receiver<bool>) {
        let period = self.config.tick_interval();
        let slots = self.config.max_concurrent_passes.max(1);
        info!(
            "Notification scheduler started (tick {}s, cooldown {}h, {} slot(s))",
            self.config.tick_interval_seconds, self.config.cooldown_hours, slots
        );

        let semaphore = Arc::new(Semaphore::new(slots));
        let mut passes = JoinSet::new();
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    // A dropped handle closes the channel; treat it as shutdown.
                    if changed.is_err() || *cancel.borrow() {
                        info!("Notification scheduler received shutdown signal");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let Ok(permit) = semaphore.clone().try_acquire_owned() else {
                        warn!("Previous notification pass still running, skipping tick");
                        continue;
                    };
                    let pass = Arc::clone(&self.pass);
                    passes.spawn(async move {
                        let _permit = permit;
                        if let Err(e) = pass.run_one_pass().await {
                            error!("Notification pass failed: {}", e);
                        }
                    });
                }
                Some(joined) = passes.join_next(), if !passes.is_empty() => {
                    if let Err(e) = joined {
                        error!("Notification pass task panicked: {}", e);
                    }
                }
            }
        }

        debug!("Waiting for {} in-flight pass(es)", passes.len());
        let drain = async { while passes.join_next().await.is_some() {} };
        if time::timeout(self.config.shutdown_timeout(), drain).await.is_err() {
            warn!(
                "Shutdown timeout reached, abandoning {} in-flight pass(es)",
                passes.len()
            );
            passes.abort_all();
        }

        info!("Notification scheduler stopped");
    }
}

/// Handle to a running scheduler
#[derive(Debug)]
pub struct SchedulerHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop future ticks without waiting
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Whether the tick loop has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop future ticks and wait for in-flight passes, bounded by the
    /// configured shutdown timeout.
    pub async fn shutdown(self) {
        self.cancel();
        if let Err(e) = self.task.await {
            error!("Notification scheduler task failed: {}", e);
        }
    }
}
