//! Integration tests for a full reminder pass.

mod helpers;

use chrono::{Duration, Utc};

use cubby_core::types::id::UserId;
use cubby_entity::push_token::Platform;
use cubby_worker::NotifyError;

#[tokio::test]
async fn test_bedsheet_change_end_to_end() {
    let app = helpers::TestApp::new();
    let now = Utc::now();
    let home = app.household("abc123");
    let tracker = app.tracker_done_days_ago(home.family, "Bedsheet Change", 14, 15, now);

    let report = app.pass().run_pass_at(now).await.unwrap();
    assert_eq!(report.due_trackers, 1);
    assert_eq!(report.batches, 1);

    let sent = app.gateway.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].device_token, "abc123");
    assert_eq!(sent[0].title, "Cubby Reminder");
    assert_eq!(sent[0].body, "Trackers due: Bedsheet Change");

    let log = app.store.notification_log(tracker, home.owner).unwrap();
    assert_eq!(log.last_notified_at, now);
}

#[tokio::test]
async fn test_second_pass_within_cooldown_sends_nothing() {
    let app = helpers::TestApp::new();
    let now = Utc::now();
    let home = app.household("abc123");
    app.tracker_done_days_ago(home.family, "Bedsheet Change", 14, 15, now);

    let pass = app.pass();
    pass.run_pass_at(now).await.unwrap();
    pass.run_pass_at(now + Duration::minutes(30)).await.unwrap();
    assert_eq!(app.gateway.sent().len(), 1);

    // A tracker that became due in between is still sent.
    app.tracker_done_days_ago(home.family, "Filter", 30, 31, now);
    pass.run_pass_at(now + Duration::hours(1)).await.unwrap();
    assert_eq!(
        app.bodies_for(&home.token),
        vec!["Trackers due: Bedsheet Change", "Trackers due: Filter"]
    );

    // After the cooldown both are sent again, in one message.
    pass.run_pass_at(now + Duration::hours(8)).await.unwrap();
    let bodies = app.bodies_for(&home.token);
    assert_eq!(bodies.len(), 3);
    assert!(bodies[2].contains("Bedsheet Change"));
    assert!(bodies[2].contains("Filter"));
}

#[tokio::test]
async fn test_two_trackers_one_device_single_message() {
    let app = helpers::TestApp::new();
    let now = Utc::now();
    let home = app.household("D");
    let t1 = app.tracker_done_days_ago(home.family, "Bedsheet Change", 14, 20, now);
    let t2 = app.tracker_done_days_ago(home.family, "Towels", 7, 9, now);

    app.pass().run_pass_at(now).await.unwrap();

    let bodies = app.bodies_for("D");
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].starts_with("Trackers due: "));
    assert!(bodies[0].contains("Bedsheet Change"));
    assert!(bodies[0].contains("Towels"));
    assert!(app.store.notification_log(t1, home.owner).is_some());
    assert!(app.store.notification_log(t2, home.owner).is_some());
}

#[tokio::test]
async fn test_rejected_device_is_retried_next_pass() {
    let app = helpers::TestApp::new();
    let now = Utc::now();
    let home = app.household("D1");
    let member = UserId::new();
    app.store.add_member(home.family, member);
    app.store.register_token(member, "D2", Platform::Ios);
    let tracker = app.tracker_done_days_ago(home.family, "Filter", 30, 40, now);
    app.gateway.reject_token("D2");

    let err = app.pass().run_pass_at(now).await.unwrap_err();
    assert!(matches!(
        err,
        NotifyError::PartialDelivery {
            failed_messages: 1,
            total_messages: 2,
            ..
        }
    ));
    assert!(app.store.notification_log(tracker, home.owner).is_some());
    assert!(app.store.notification_log(tracker, member).is_none());

    // Only the rejected recipient is still eligible.
    app.gateway.clear();
    let later = now + Duration::minutes(1);
    let err = app.pass().run_pass_at(later).await.unwrap_err();
    assert!(matches!(
        err,
        NotifyError::PartialDelivery {
            failed_messages: 1,
            total_messages: 1,
            ..
        }
    ));
    assert!(app.gateway.sent().is_empty());
}

#[tokio::test]
async fn test_gateway_outage_leaves_ledger_untouched() {
    let app = helpers::TestApp::new();
    let now = Utc::now();
    let home = app.household("abc123");
    app.tracker_done_days_ago(home.family, "Bedsheet Change", 14, 15, now);
    app.gateway.set_unreachable(true);

    let err = app.pass().run_pass_at(now).await.unwrap_err();
    assert!(matches!(err, NotifyError::Gateway(_)));
    assert_eq!(app.store.log_count(), 0);

    app.gateway.set_unreachable(false);
    app.pass().run_pass_at(now + Duration::minutes(1)).await.unwrap();
    assert_eq!(app.gateway.sent().len(), 1);
}

#[tokio::test]
async fn test_cooldown_boundaries() {
    let app = helpers::TestApp::new();
    let now = Utc::now();
    let home = app.household("abc123");
    let tracker = app.tracker_done_days_ago(home.family, "Bedsheet Change", 14, 15, now);

    app.store
        .set_notified(tracker, home.owner, now - Duration::hours(1));
    let report = app.pass().run_pass_at(now).await.unwrap();
    assert_eq!(report.recipients, 0);
    assert!(app.gateway.sent().is_empty());

    app.store
        .set_notified(tracker, home.owner, now - Duration::hours(7));
    let report = app.pass().run_pass_at(now).await.unwrap();
    assert_eq!(report.recipients, 1);
    assert_eq!(app.gateway.sent().len(), 1);
}

#[tokio::test]
async fn test_malformed_and_empty_trackers_do_not_abort_pass() {
    let app = helpers::TestApp::new();
    let now = Utc::now();
    let home = app.household("abc123");
    let broken = app.store.add_tracker(home.family, "Gutter", 1, "day");
    app.store
        .add_entry(broken, now - Duration::days(400), 1, "fortnight");
    app.store.add_tracker(home.family, "Never Done", 1, "day");
    app.tracker_done_days_ago(home.family, "Bedsheet Change", 14, 15, now);

    let report = app.pass().run_pass_at(now).await.unwrap();
    assert_eq!(report.due_trackers, 1);
    assert_eq!(app.bodies_for("abc123"), vec!["Trackers due: Bedsheet Change"]);
}

#[tokio::test]
async fn test_store_outage_sends_nothing() {
    let app = helpers::TestApp::new();
    let now = Utc::now();
    let home = app.household("abc123");
    app.tracker_done_days_ago(home.family, "Bedsheet Change", 14, 15, now);
    app.store.fail_reads(true);

    let err = app.pass().run_pass_at(now).await.unwrap_err();
    assert!(matches!(err, NotifyError::DueSet(_)));
    assert_eq!(app.gateway.batch_count(), 0);
}
