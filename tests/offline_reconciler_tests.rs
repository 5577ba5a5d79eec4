// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

mod common;
use common::{offline_record, test_store, ScriptedUploader};

use ruck_session_engine::sync::OfflineReconciler;

#[tokio::test]
async fn test_complete_or_enqueue_uploads_directly_when_backend_reachable() {
    let (_kv, store) = test_store();
    let reconciler = OfflineReconciler::new(store.clone());
    let uploader = ScriptedUploader::new();

    let uploaded = reconciler
        .complete_or_enqueue(&uploader, offline_record("off-1", 0, None))
        .await;

    assert!(uploaded);
    assert_eq!(uploader.upload_count(), 1);
    assert!(store.list_pending_offline_completions().is_empty());
}

#[tokio::test]
async fn test_complete_or_enqueue_queues_on_failure() {
    let (_kv, store) = test_store();
    let reconciler = OfflineReconciler::new(store.clone());
    let uploader = ScriptedUploader::new();
    uploader.fail_for("off-1");

    let uploaded = reconciler
        .complete_or_enqueue(&uploader, offline_record("off-1", 0, None))
        .await;

    assert!(!uploaded);
    let pending = store.list_pending_offline_completions();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].offline_id, "off-1");
}

#[tokio::test]
async fn test_reconcile_marks_successes_and_keeps_failures_pending() {
    let (_kv, store) = test_store();
    store.enqueue_offline_completion(offline_record("off-1", 1, None));
    store.enqueue_offline_completion(offline_record("off-2", 1, None));
    store.enqueue_offline_completion(offline_record("off-3", 1, None));

    let reconciler = OfflineReconciler::new(store.clone());
    let uploader = ScriptedUploader::new();
    uploader.fail_for("off-2");

    let outcome = reconciler.reconcile(&uploader).await;

    assert_eq!(outcome.synced, 2);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.failed_ids, vec!["off-2".to_string()]);
    assert!(outcome.is_partial_failure());

    let pending = store.list_pending_offline_completions();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].offline_id, "off-2");
}

#[tokio::test]
async fn test_reconcile_retries_failures_on_next_pass() {
    let (_kv, store) = test_store();
    store.enqueue_offline_completion(offline_record("off-1", 1, None));

    let reconciler = OfflineReconciler::new(store.clone());
    let flaky = ScriptedUploader::new();
    flaky.fail_for("off-1");

    let first = reconciler.reconcile(&flaky).await;
    assert!(first.is_complete_failure());

    // Connectivity returns.
    let healthy = ScriptedUploader::new();
    let second = reconciler.reconcile(&healthy).await;

    assert_eq!(second.synced, 1);
    assert!(second.is_complete_success());
    assert!(store.list_pending_offline_completions().is_empty());
}

#[tokio::test]
async fn test_reconcile_with_empty_queue_does_nothing() {
    let (_kv, store) = test_store();
    let reconciler = OfflineReconciler::new(store);
    let uploader = ScriptedUploader::new();

    let outcome = reconciler.reconcile(&uploader).await;

    assert_eq!(outcome.synced, 0);
    assert_eq!(outcome.failed, 0);
    assert!(outcome.is_complete_success());
    assert_eq!(uploader.upload_count(), 0);
}
