// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Offline completion reconciliation.
//!
//! A session that completes while the backend is unreachable becomes an
//! [`OfflineCompletedSession`] in the store's queue. An external sync worker
//! calls [`OfflineReconciler::reconcile`] when connectivity returns; the
//! uploader's success or failure is the sole signal deciding whether a
//! record is marked synced or stays pending.

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{CompletionPayload, OfflineCompletedSession};
use crate::store::SessionStore;

/// Errors from the backend upload endpoint.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Backend rejected payload: {0}")]
    Rejected(String),
}

/// Backend upload endpoint for completion payloads.
#[async_trait]
pub trait CompletionUploader: Send + Sync {
    async fn upload(&self, payload: &CompletionPayload) -> Result<(), UploadError>;
}

/// Result of one reconcile pass over the pending queue.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    /// Records uploaded and marked synced this pass.
    pub synced: u32,
    /// Records that failed to upload and stay pending.
    pub failed: u32,
    /// Offline ids of the records that failed.
    pub failed_ids: Vec<String>,
}

impl SyncOutcome {
    /// True if every pending record synced.
    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }

    /// True if nothing synced and at least one record failed.
    pub fn is_complete_failure(&self) -> bool {
        self.synced == 0 && self.failed > 0
    }

    /// True if some records synced and some failed.
    pub fn is_partial_failure(&self) -> bool {
        self.synced > 0 && self.failed > 0
    }
}

/// Drains the offline completion queue against the backend.
pub struct OfflineReconciler {
    store: Arc<SessionStore>,
}

impl OfflineReconciler {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Session-completion path: one upload attempt, queue on failure.
    ///
    /// Returns true if the completion reached the backend directly.
    pub async fn complete_or_enqueue(
        &self,
        uploader: &dyn CompletionUploader,
        record: OfflineCompletedSession,
    ) -> bool {
        match uploader.upload(&record.payload).await {
            Ok(()) => {
                tracing::info!(
                    offline_id = %record.offline_id,
                    "Completion uploaded directly"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    offline_id = %record.offline_id,
                    error = %e,
                    "Completion upload failed; enqueueing offline"
                );
                self.store.enqueue_offline_completion(record);
                false
            }
        }
    }

    /// Upload every pending record, marking each synced on success.
    ///
    /// Records are processed sequentially; a failure leaves that record
    /// pending for the next pass and does not stop the drain.
    pub async fn reconcile(&self, uploader: &dyn CompletionUploader) -> SyncOutcome {
        let pending = self.store.list_pending_offline_completions();
        if pending.is_empty() {
            tracing::debug!("Reconcile: no pending offline completions");
            return SyncOutcome::default();
        }

        tracing::info!(pending = pending.len(), "Reconciling offline completions");
        let mut outcome = SyncOutcome::default();

        for record in pending {
            match uploader.upload(&record.payload).await {
                Ok(()) => {
                    self.store.mark_offline_completion_synced(&record.offline_id);
                    outcome.synced += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        offline_id = %record.offline_id,
                        error = %e,
                        "Offline completion upload failed; will retry next pass"
                    );
                    outcome.failed += 1;
                    outcome.failed_ids.push(record.offline_id);
                }
            }
        }

        tracing::info!(
            synced = outcome.synced,
            failed = outcome.failed,
            "Reconcile pass finished"
        );
        outcome
    }
}
