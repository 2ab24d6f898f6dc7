//! Integration tests for the periodic scheduler.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use cubby_core::config::NotifierConfig;
use cubby_worker::NotificationScheduler;

fn fast_notifier() -> NotifierConfig {
    NotifierConfig {
        tick_interval_seconds: 5,
        ..NotifierConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_delivers_once_per_cooldown() {
    let app = helpers::TestApp::with_notifier(fast_notifier());
    let now = Utc::now();
    let home = app.household("abc123");
    app.tracker_done_days_ago(home.family, "Bedsheet Change", 14, 15, now);

    let handle = NotificationScheduler::new(Arc::new(app.pass()), app.notifier.clone())
        .start()
        .unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;
    handle.shutdown().await;

    assert_eq!(app.bodies_for("abc123"), vec!["Trackers due: Bedsheet Change"]);
    assert_eq!(app.store.log_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_pass_does_not_stop_scheduler() {
    let app = helpers::TestApp::with_notifier(fast_notifier());
    let now = Utc::now();
    let home = app.household("abc123");
    app.tracker_done_days_ago(home.family, "Bedsheet Change", 14, 15, now);
    app.gateway.set_unreachable(true);

    let handle = NotificationScheduler::new(Arc::new(app.pass()), app.notifier.clone())
        .start()
        .unwrap();
    tokio::time::sleep(Duration::from_secs(12)).await;
    assert!(app.gateway.sent().is_empty());
    assert!(!handle.is_finished());

    app.gateway.set_unreachable(false);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(app.gateway.sent().len(), 1);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_returns_promptly_when_idle() {
    let app = helpers::TestApp::with_notifier(fast_notifier());
    let handle = NotificationScheduler::new(Arc::new(app.pass()), app.notifier.clone())
        .start()
        .unwrap();

    tokio::time::timeout(Duration::from_secs(1), handle.shutdown())
        .await
        .expect("scheduler should stop without waiting for a tick");
    assert_eq!(app.gateway.batch_count(), 0);
}
