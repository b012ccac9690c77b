mod common;

use std::time::Duration;

use common::{harness, harness_with};
use tasksync::constants::{LOCAL_ID_PREFIX, MAX_IMAGE_BYTES};
use tasksync::image::Image;
use tasksync::models::{NewTask, Priority, TaskPatch, ValidationError};
use tasksync::notify::Notification;
use tasksync::remote::{RemoteStore, RemoteTaskArgs};
use tasksync::storage::{LocalStorage, StorageError};
use tasksync::sync::{SkipReason, SyncError, SyncOutcome, SyncReport, SyncSettings, SyncStatus};

/// Wait until nothing is left to push, or give up after two seconds.
async fn wait_until_synced(storage: &LocalStorage) -> bool {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if storage.count_unsynced().await.unwrap() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}

fn expect_completed(outcome: SyncOutcome) -> SyncReport {
    match outcome {
        SyncOutcome::Completed(report) => report,
        other => panic!("expected a completed pass, got {other:?}"),
    }
}

#[tokio::test]
async fn test_add_online_round_trip() {
    let h = harness(true).await;

    let task = h.sync.add_task(NewTask::new("A")).await.unwrap();

    assert!(task.synced);
    assert!(!task.id.starts_with(LOCAL_ID_PREFIX));
    assert_eq!(task.remote_id.as_deref(), Some(task.id.as_str()));

    let remote = h.remote.inner.snapshot().await;
    assert_eq!(remote.len(), 1);
    assert_eq!(remote[0].id, task.id);

    let shown = h.sync.get_tasks().await.unwrap();
    assert_eq!(shown.iter().filter(|t| t.title == "A").count(), 1);
}

#[tokio::test]
async fn test_add_offline_is_durable_and_pushed_later() {
    let h = harness(false).await;

    let task = h.sync.add_task(NewTask::new("B")).await.unwrap();
    assert!(!task.synced);
    assert!(task.id.starts_with(LOCAL_ID_PREFIX));
    assert!(h.remote.inner.snapshot().await.is_empty());

    h.connectivity.set_online(true);
    let report = expect_completed(h.sync.sync_now().await);
    assert_eq!(report.pushed, 1);
    assert_eq!(report.failed, 0);

    let local = h.storage.list_all().await.unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].title, "B");
    assert!(local[0].synced);

    let remote = h.remote.inner.snapshot().await;
    assert_eq!(remote.len(), 1);
    assert_eq!(remote[0].id, local[0].id);
}

#[tokio::test]
async fn test_add_with_unreachable_remote_stays_local() {
    let h = harness(true).await;
    h.remote.inner.set_available(false);

    let task = h.sync.add_task(NewTask::new("Quiet")).await.unwrap();
    assert!(!task.synced);

    assert_eq!(h.sync.sync_now().await, SyncOutcome::Unreachable);
    assert_eq!(h.sync.last_sync_error().await, None);
    assert_eq!(h.sync.status().await, SyncStatus::Idle);
    assert_eq!(h.storage.count_unsynced().await.unwrap(), 1);
}

#[tokio::test]
async fn test_one_failing_record_does_not_block_the_rest() {
    let h = harness(false).await;
    for title in ["first", "second", "third"] {
        h.sync.add_task(NewTask::new(title)).await.unwrap();
    }
    h.remote.fail_title("second");
    h.connectivity.set_online(true);

    let report = expect_completed(h.sync.sync_now().await);
    assert_eq!(report.pushed, 2);
    assert_eq!(report.failed, 1);

    for task in h.storage.list_all().await.unwrap() {
        assert_eq!(task.synced, task.title != "second", "{}", task.title);
    }

    // The failed record goes through on the next pass
    h.remote.heal_title("second");
    let report = expect_completed(h.sync.sync_now().await);
    assert_eq!(report.pushed, 1);
    assert_eq!(h.storage.count_unsynced().await.unwrap(), 0);
    assert_eq!(h.remote.inner.snapshot().await.len(), 3);
}

#[tokio::test]
async fn test_offline_completion_survives_create() {
    let h = harness(false).await;
    h.remote.set_ignore_completed_on_create(true);
    let task = h.sync.add_task(NewTask::new("B")).await.unwrap();
    h.sync.toggle_complete(&task.id).await.unwrap();

    h.connectivity.set_online(true);
    let report = expect_completed(h.sync.sync_now().await);
    assert_eq!(report.pushed, 1);

    let local = h.storage.list_all().await.unwrap();
    assert_eq!(local.len(), 1);
    assert!(local[0].completed);
    assert!(local[0].synced);
    assert!(!local[0].id.starts_with(LOCAL_ID_PREFIX));

    let remote = h.remote.inner.snapshot().await;
    assert_eq!(remote.len(), 1);
    assert!(remote[0].completed);
}

#[tokio::test]
async fn test_dropped_field_is_retried_when_follow_up_fails() {
    let h = harness(false).await;
    h.remote.set_ignore_completed_on_create(true);
    let task = h.sync.add_task(NewTask::new("B").with_completed(true)).await.unwrap();

    // The create goes through but the corrective update does not
    h.remote.set_fail_updates(true);
    h.connectivity.set_online(true);
    let report = expect_completed(h.sync.sync_now().await);
    assert_eq!(report.pushed, 0);
    assert_eq!(report.deferred, 1);

    let local = h.storage.list_all().await.unwrap();
    assert!(local[0].completed);
    assert!(!local[0].synced);
    assert_ne!(local[0].id, task.id);

    h.remote.set_fail_updates(false);
    assert_eq!(expect_completed(h.sync.sync_now().await).pushed, 1);
    assert!(h.remote.inner.snapshot().await[0].completed);
    assert_eq!(h.remote.inner.snapshot().await.len(), 1);
}

#[tokio::test]
async fn test_second_sync_changes_nothing() {
    let h = harness(false).await;
    h.sync.add_task(NewTask::new("one")).await.unwrap();
    h.sync.add_task(NewTask::new("two")).await.unwrap();
    h.connectivity.set_online(true);
    expect_completed(h.sync.sync_now().await);

    let local_before = h.storage.list_all().await.unwrap();
    let remote_before = h.remote.inner.snapshot().await;

    assert_eq!(expect_completed(h.sync.sync_now().await), SyncReport::default());
    assert_eq!(h.storage.list_all().await.unwrap(), local_before);
    assert_eq!(h.remote.inner.snapshot().await, remote_before);
}

#[tokio::test]
async fn test_delete_online() {
    let h = harness(true).await;
    let task = h.sync.add_task(NewTask::new("Gone")).await.unwrap();

    h.sync.delete_task(&task.id).await.unwrap();

    assert!(h.storage.get(&task.id).await.unwrap().is_none());
    assert!(h.storage.list_tombstones().await.unwrap().is_empty());
    assert!(h.remote.inner.snapshot().await.is_empty());
    assert!(h.sync.get_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_remote_delete_stays_hidden_and_is_retried() {
    let h = harness(true).await;
    let task = h.sync.add_task(NewTask::new("Gone")).await.unwrap();
    h.remote.set_fail_deletes(true);

    h.sync.delete_task(&task.id).await.unwrap();

    assert_eq!(h.storage.list_tombstones().await.unwrap().len(), 1);
    assert_eq!(h.remote.inner.snapshot().await.len(), 1);
    let shown = h.sync.get_tasks().await.unwrap();
    assert!(shown.iter().all(|t| t.title != "Gone"));

    h.remote.set_fail_deletes(false);
    let report = expect_completed(h.sync.sync_now().await);
    assert_eq!(report.tombstones_cleared, 1);
    assert!(h.remote.inner.snapshot().await.is_empty());
    assert!(h.storage.list_tombstones().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_offline_reaches_remote_after_reconnect() {
    let h = harness(true).await;
    let task = h.sync.add_task(NewTask::new("Later")).await.unwrap();
    h.connectivity.set_online(false);

    h.sync.delete_task(&task.id).await.unwrap();
    assert!(h.storage.get(&task.id).await.unwrap().is_none());
    assert_eq!(h.remote.inner.snapshot().await.len(), 1);

    h.connectivity.set_online(true);
    assert!(h.sync.get_tasks().await.unwrap().is_empty());
    expect_completed(h.sync.sync_now().await);
    assert!(h.remote.inner.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_delete_local_only_task_needs_no_tombstone() {
    let h = harness(false).await;
    let task = h.sync.add_task(NewTask::new("Draft")).await.unwrap();

    h.sync.delete_task(&task.id).await.unwrap();

    assert!(h.storage.list_all().await.unwrap().is_empty());
    assert!(h.storage.list_tombstones().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_missing_task_succeeds() {
    let h = harness(false).await;
    h.sync.delete_task("local-does-not-exist").await.unwrap();
}

#[tokio::test]
async fn test_update_online_pushes_change() {
    let h = harness(true).await;
    let task = h.sync.add_task(NewTask::new("Draft")).await.unwrap();

    let updated = h.sync.update_task(&task.id, TaskPatch::title("Final")).await.unwrap();

    assert!(updated.synced);
    assert_eq!(updated.title, "Final");
    assert!(updated.updated_at > task.updated_at);
    assert_eq!(h.remote.inner.snapshot().await[0].title, "Final");
}

#[tokio::test]
async fn test_update_offline_is_pushed_later() {
    let h = harness(true).await;
    let task = h.sync.add_task(NewTask::new("Draft")).await.unwrap();
    h.connectivity.set_online(false);

    let updated = h
        .sync
        .update_task(&task.id, TaskPatch::priority(Priority::High))
        .await
        .unwrap();
    assert!(!updated.synced);
    assert_eq!(h.remote.inner.snapshot().await[0].priority, Priority::Medium);

    h.connectivity.set_online(true);
    assert_eq!(expect_completed(h.sync.sync_now().await).pushed, 1);
    assert_eq!(h.remote.inner.snapshot().await[0].priority, Priority::High);
    assert!(h.storage.get(&task.id).await.unwrap().unwrap().synced);
}

#[tokio::test]
async fn test_update_missing_task_is_not_found() {
    let h = harness(true).await;
    let err = h.sync.update_task("nope", TaskPatch::title("x")).await.unwrap_err();
    assert!(matches!(err, SyncError::Storage(StorageError::NotFound(_))));
}

#[tokio::test]
async fn test_clearing_image_reaches_remote() {
    let h = harness(true).await;
    let task = h
        .sync
        .add_task(NewTask::new("Photo").with_image(Image::from_bytes(b"png bytes", "image/png")))
        .await
        .unwrap();
    assert!(task.photo.as_deref().unwrap().starts_with("data:image/png;base64,"));
    assert!(h.remote.inner.snapshot().await[0].image.is_some());

    let patch = TaskPatch {
        image: Some(None),
        ..Default::default()
    };
    let updated = h.sync.update_task(&task.id, patch).await.unwrap();

    assert!(updated.image.is_none());
    assert!(updated.photo.is_none());
    assert!(h.remote.inner.snapshot().await[0].image.is_none());
}

#[tokio::test]
async fn test_blank_title_rejected_before_storage() {
    let h = harness(true).await;

    let err = h.sync.add_task(NewTask::new("   ")).await.unwrap_err();
    assert!(matches!(err, SyncError::Validation(ValidationError::MissingTitle)));

    let task = h.sync.add_task(NewTask::new("Keep")).await.unwrap();
    let err = h.sync.update_task(&task.id, TaskPatch::title("")).await.unwrap_err();
    assert!(matches!(err, SyncError::Validation(ValidationError::MissingTitle)));

    let local = h.storage.list_all().await.unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].title, "Keep");
}

#[tokio::test]
async fn test_image_size_boundary() {
    let h = harness(true).await;

    let at_limit = Image::from_bytes(&vec![0u8; MAX_IMAGE_BYTES], "image/jpeg");
    let task = h.sync.add_task(NewTask::new("Big").with_image(at_limit)).await.unwrap();
    assert!(task.synced);

    let over_limit = Image::from_bytes(&vec![0u8; MAX_IMAGE_BYTES + 1], "image/jpeg");
    let err = h
        .sync
        .add_task(NewTask::new("Too big").with_image(over_limit))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::Validation(ValidationError::ImageTooLarge { .. })
    ));
    assert_eq!(h.storage.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unsupported_image_type_rejected() {
    let h = harness(false).await;
    let image = Image::from_bytes(b"%PDF", "application/pdf");
    let err = h.sync.add_task(NewTask::new("Doc").with_image(image)).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Validation(ValidationError::UnsupportedImageType(_))
    ));
}

#[tokio::test]
async fn test_get_tasks_merges_remote_and_unsynced_local() {
    let h = harness(true).await;
    h.remote.inner.set_available(false);
    let local = h.sync.add_task(NewTask::new("Local only")).await.unwrap();
    h.remote.inner.set_available(true);

    // A record created by another client
    h.remote
        .inner
        .create_task(RemoteTaskArgs {
            title: Some("From elsewhere".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    let shown = h.sync.get_tasks().await.unwrap();
    assert_eq!(shown.len(), 2);
    assert!(shown.iter().any(|t| t.title == "From elsewhere" && t.synced));
    assert!(shown.iter().any(|t| t.id == local.id && !t.synced));
}

#[tokio::test]
async fn test_get_tasks_falls_back_to_local() {
    let h = harness(false).await;
    h.sync.add_task(NewTask::new("Offline")).await.unwrap();
    assert_eq!(h.sync.get_tasks().await.unwrap().len(), 1);

    // Online with a failing list endpoint
    h.connectivity.set_online(true);
    h.remote.set_fail_lists(true);
    assert_eq!(h.sync.get_tasks().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_stats_local_and_remote() {
    let h = harness(false).await;
    h.sync
        .add_task(NewTask::new("urgent").with_priority(Priority::High))
        .await
        .unwrap();
    let done = h.sync.add_task(NewTask::new("done")).await.unwrap();
    h.sync.toggle_complete(&done.id).await.unwrap();

    let local = h.sync.get_stats().await.unwrap();
    assert_eq!(local.total, 2);
    assert_eq!(local.completed, 1);
    assert_eq!(local.pending, 1);
    assert_eq!(local.high_priority, 1);

    h.connectivity.set_online(true);
    expect_completed(h.sync.sync_now().await);
    let remote = h.sync.get_stats().await.unwrap();
    assert_eq!(remote, h.remote.inner.stats().await.unwrap());
    assert_eq!(remote, local);
}

#[tokio::test]
async fn test_notifications() {
    let h = harness(true).await;
    let task = h.sync.add_task(NewTask::new("Walk")).await.unwrap();
    h.sync.toggle_complete(&task.id).await.unwrap();
    // Reopening is not announced
    h.sync.toggle_complete(&task.id).await.unwrap();
    h.sync.sync_now().await;

    assert_eq!(
        h.notifier.events(),
        vec![
            Notification::TaskAdded {
                title: "Walk".to_string()
            },
            Notification::TaskCompleted {
                title: "Walk".to_string()
            },
            Notification::SyncCompleted { pushed: 0 },
        ]
    );
}

#[tokio::test]
async fn test_sync_skipped_while_offline() {
    let h = harness(false).await;
    assert_eq!(h.sync.sync_now().await, SyncOutcome::Skipped(SkipReason::Offline));
}

#[tokio::test]
async fn test_concurrent_sync_is_skipped() {
    let h = harness(true).await;
    h.remote.set_health_delay(Duration::from_millis(200));

    let first = {
        let sync = h.sync.clone();
        tokio::spawn(async move { sync.sync_now().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(h.sync.is_syncing());
    assert_eq!(h.sync.status().await, SyncStatus::InProgress);
    assert_eq!(h.sync.sync_now().await, SyncOutcome::Skipped(SkipReason::AlreadySyncing));

    expect_completed(first.await.unwrap());
    assert!(!h.sync.is_syncing());
}

#[tokio::test]
async fn test_manual_sync_cooldown() {
    let settings = SyncSettings {
        manual_sync_cooldown: Duration::from_secs(60),
        auto_sync_interval: None,
    };
    let h = harness_with(true, settings).await;

    expect_completed(h.sync.request_manual_sync().await);
    assert_eq!(
        h.sync.request_manual_sync().await,
        SyncOutcome::Skipped(SkipReason::Cooldown)
    );
    // Automatic passes ignore the cooldown
    expect_completed(h.sync.sync_now().await);
}

#[tokio::test]
async fn test_failed_pass_is_recorded_and_cleared() {
    let h = harness(true).await;
    h.remote.set_fail_lists(true);

    let outcome = h.sync.sync_now().await;
    assert!(matches!(outcome, SyncOutcome::Failed { .. }));
    assert!(h.sync.last_sync_error().await.is_some());
    assert!(matches!(h.sync.status().await, SyncStatus::Error { .. }));
    assert!(h
        .notifier
        .events()
        .iter()
        .any(|event| matches!(event, Notification::SyncFailed { .. })));

    h.remote.set_fail_lists(false);
    expect_completed(h.sync.sync_now().await);
    assert_eq!(h.sync.last_sync_error().await, None);
    assert_eq!(h.sync.status().await, SyncStatus::Success);
    assert!(h.sync.last_sync_time().await.is_some());
}

#[tokio::test]
async fn test_reconnect_triggers_sync() {
    let h = harness(false).await;
    h.sync.add_task(NewTask::new("Queued")).await.unwrap();
    let handle = h.sync.spawn_trigger_loop();

    h.connectivity.set_online(true);

    assert!(wait_until_synced(&h.storage).await);
    assert_eq!(h.remote.inner.snapshot().await.len(), 1);
    handle.abort();
}

#[tokio::test]
async fn test_background_signal_triggers_sync() {
    let h = harness(true).await;
    h.remote.inner.set_available(false);
    h.sync.add_task(NewTask::new("Queued")).await.unwrap();
    h.remote.inner.set_available(true);
    let handle = h.sync.spawn_trigger_loop();

    h.connectivity.request_background_sync();

    assert!(wait_until_synced(&h.storage).await);
    handle.abort();
}

#[tokio::test]
async fn test_auto_sync_timer() {
    let settings = SyncSettings {
        manual_sync_cooldown: Duration::from_secs(5),
        auto_sync_interval: Some(Duration::from_millis(50)),
    };
    let h = harness_with(true, settings).await;
    h.remote.inner.set_available(false);
    h.sync.add_task(NewTask::new("Queued")).await.unwrap();
    h.remote.inner.set_available(true);

    let handle = h.sync.spawn_trigger_loop();

    assert!(wait_until_synced(&h.storage).await);
    handle.abort();
}
